//! Classifier metadata stored alongside each registered artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const METRIC_ACCURACY: &str = "accuracy";
pub const METRIC_PRECISION: &str = "precision";
pub const METRIC_RECALL: &str = "recall";
pub const METRIC_F1_SCORE: &str = "f1_score";

/// Descriptive record for one registered model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierMetadata {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub target_column: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub performance_metrics: BTreeMap<String, f64>,
    /// Algorithm that produced the artifact.
    #[serde(default)]
    pub algorithm: String,
    /// Columns the classifier reads, in training order.
    #[serde(default)]
    pub feature_columns: Vec<String>,
}

impl ClassifierMetadata {
    pub fn new(id: &str, target_column: &str) -> Self {
        Self {
            id: id.to_string(),
            created_at: Utc::now(),
            target_column: target_column.to_string(),
            description: String::new(),
            performance_metrics: BTreeMap::new(),
            algorithm: String::new(),
            feature_columns: Vec::new(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: &str) -> Self {
        self.algorithm = algorithm.to_string();
        self
    }

    pub fn with_feature_columns(mut self, columns: Vec<String>) -> Self {
        self.feature_columns = columns;
        self
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.performance_metrics.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_json_roundtrip() {
        let mut meta = ClassifierMetadata::new("m1", "label").with_algorithm("decision_tree");
        meta.performance_metrics.insert(METRIC_ACCURACY.into(), 0.9);

        let json = serde_json::to_string(&meta).unwrap();
        let back: ClassifierMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
        assert_eq!(back.metric(METRIC_ACCURACY), Some(0.9));
        assert_eq!(back.metric(METRIC_RECALL), None);
    }

    #[test]
    fn test_metadata_tolerates_minimal_json() {
        let json = r#"{"id":"old","created_at":"2024-01-01T00:00:00Z","target_column":"y"}"#;
        let meta: ClassifierMetadata = serde_json::from_str(json).unwrap();
        assert!(meta.performance_metrics.is_empty());
        assert!(meta.description.is_empty());
    }
}
