//! Versioned artifact envelope persisted by the registry.
//!
//! An artifact is stored as JSON: `{"format_version": 1, "classifier": {"kind": ..., ...}}`.
//! Readers reject any other `format_version` instead of guessing at its layout;
//! a format change bumps the version and adds an explicit migration.

use crate::data::Record;
use crate::error::{ModelbenchError, Result};
use crate::model::Classifier;
use crate::model::baseline::MajorityClassifier;
use crate::model::tree::DecisionTreeClassifier;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Every classifier kind the registry knows how to store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedClassifier {
    DecisionTree(DecisionTreeClassifier),
    Majority(MajorityClassifier),
}

impl TrainedClassifier {
    fn as_classifier(&self) -> &dyn Classifier {
        match self {
            Self::DecisionTree(c) => c,
            Self::Majority(c) => c,
        }
    }

    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::DecisionTree(_) => "decision_tree",
            Self::Majority(_) => "majority",
        }
    }
}

/// A fitted classifier plus the format version it was written with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub classifier: TrainedClassifier,
}

#[derive(Deserialize)]
struct VersionProbe {
    format_version: u32,
}

impl ModelArtifact {
    pub fn new(classifier: TrainedClassifier) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            classifier,
        }
    }

    pub fn algorithm(&self) -> &'static str {
        self.classifier.algorithm()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let probe: VersionProbe = serde_json::from_slice(bytes)
            .map_err(|e| ModelbenchError::storage(format!("unreadable artifact: {e}")))?;
        if probe.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelbenchError::storage(format!(
                "unsupported artifact format version {} (this build reads version {})",
                probe.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        serde_json::from_slice(bytes)
            .map_err(|e| ModelbenchError::storage(format!("corrupt artifact: {e}")))
    }
}

impl Classifier for ModelArtifact {
    fn predict(&self, record: &Record) -> Result<Value> {
        self.classifier.as_classifier().predict(record)
    }

    fn labels(&self) -> &[Value] {
        self.classifier.as_classifier().labels()
    }

    fn feature_columns(&self) -> Vec<String> {
        self.classifier.as_classifier().feature_columns()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::model::tree::TreeParams;
    use serde_json::json;

    fn tree_artifact() -> ModelArtifact {
        let ds = Dataset::from_csv_str("x,y\n1,a\n2,a\n8,b\n9,b\n").unwrap();
        let tree = DecisionTreeClassifier::fit(&ds, "y", TreeParams::default()).unwrap();
        ModelArtifact::new(TrainedClassifier::DecisionTree(tree))
    }

    #[test]
    fn test_bytes_roundtrip() {
        let artifact = tree_artifact();
        let back = ModelArtifact::from_bytes(&artifact.to_bytes().unwrap()).unwrap();
        assert_eq!(back, artifact);
        assert_eq!(back.algorithm(), "decision_tree");

        let envelope: Value = serde_json::from_slice(&artifact.to_bytes().unwrap()).unwrap();
        assert_eq!(envelope["format_version"], json!(1));
        assert_eq!(envelope["classifier"]["kind"], json!("decision_tree"));
    }

    #[test]
    fn test_rejects_other_format_version() {
        let mut envelope: Value = serde_json::from_slice(&tree_artifact().to_bytes().unwrap()).unwrap();
        envelope["format_version"] = json!(2);
        let err = ModelArtifact::from_bytes(&serde_json::to_vec(&envelope).unwrap()).unwrap_err();
        assert!(matches!(err, ModelbenchError::Storage(_)));
        assert!(err.to_string().contains("version 2"));
    }

    #[test]
    fn test_delegates_prediction() {
        let artifact = tree_artifact();
        let mut r = Record::new();
        r.insert("x".into(), json!(8.5));
        assert_eq!(artifact.predict(&r).unwrap(), json!("b"));
        assert_eq!(artifact.feature_columns(), vec!["x".to_string()]);
    }
}
