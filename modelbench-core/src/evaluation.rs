//! Held-out evaluation of a fitted classifier.

use crate::data::Dataset;
use crate::error::{ModelbenchError, Result};
use crate::metadata::{METRIC_ACCURACY, METRIC_F1_SCORE, METRIC_PRECISION, METRIC_RECALL};
use crate::model::Classifier;
use crate::model::features::value_key;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Classification metrics. Precision, recall and F1 are macro-averaged over
/// every label that occurs among the actual or predicted values; a label with
/// an empty denominator contributes 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl ClassificationMetrics {
    pub fn from_predictions(actual: &[String], predicted: &[String]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(ModelbenchError::evaluation(format!(
                "{} actual labels but {} predictions",
                actual.len(),
                predicted.len()
            )));
        }
        if actual.is_empty() {
            return Err(ModelbenchError::evaluation("no rows to evaluate"));
        }

        let n = actual.len() as f64;
        let correct = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();

        let labels: BTreeSet<&str> = actual
            .iter()
            .chain(predicted)
            .map(String::as_str)
            .collect();

        let (mut precision, mut recall, mut f1) = (0.0, 0.0, 0.0);
        for label in &labels {
            let tp = actual
                .iter()
                .zip(predicted)
                .filter(|(a, p)| a == label && p == label)
                .count() as f64;
            let predicted_pos = predicted.iter().filter(|p| p == label).count() as f64;
            let actual_pos = actual.iter().filter(|a| a == label).count() as f64;

            let p = if predicted_pos > 0.0 { tp / predicted_pos } else { 0.0 };
            let r = if actual_pos > 0.0 { tp / actual_pos } else { 0.0 };
            let f = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };
            precision += p;
            recall += r;
            f1 += f;
        }
        let k = labels.len() as f64;

        Ok(Self {
            accuracy: correct as f64 / n,
            precision: precision / k,
            recall: recall / k,
            f1_score: f1 / k,
        })
    }

    /// Metric name → score, using the names stored in [`crate::ClassifierMetadata`].
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            (METRIC_ACCURACY.to_string(), self.accuracy),
            (METRIC_PRECISION.to_string(), self.precision),
            (METRIC_RECALL.to_string(), self.recall),
            (METRIC_F1_SCORE.to_string(), self.f1_score),
        ])
    }
}

/// Scores a fitted model against a held-out subset.
pub trait Evaluator: Send + Sync {
    fn evaluate(
        &self,
        model: &dyn Classifier,
        target_column: &str,
        test: &Dataset,
    ) -> Result<ClassificationMetrics>;
}

/// Predicts every test row and compares with its target value.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldoutEvaluator;

impl Evaluator for HoldoutEvaluator {
    fn evaluate(
        &self,
        model: &dyn Classifier,
        target_column: &str,
        test: &Dataset,
    ) -> Result<ClassificationMetrics> {
        let target_idx = test.column_index(target_column).ok_or_else(|| {
            ModelbenchError::evaluation(format!("target column '{target_column}' not in test data"))
        })?;

        let mut actual = Vec::with_capacity(test.len());
        let mut predicted = Vec::with_capacity(test.len());
        for (row_idx, record) in test.records().enumerate() {
            let truth = &test.rows[row_idx][target_idx];
            if truth.is_null() {
                return Err(ModelbenchError::evaluation(format!(
                    "target column '{target_column}' is empty in test row {}",
                    row_idx + 1
                )));
            }
            let prediction = model.predict(&record)?;
            actual.push(value_key(truth));
            predicted.push(value_key(&prediction));
        }

        ClassificationMetrics::from_predictions(&actual, &predicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use crate::model::MajorityClassifier;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_perfect_predictions() {
        let labels = s(&["a", "b", "a"]);
        let m = ClassificationMetrics::from_predictions(&labels, &labels).unwrap();
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1_score, 1.0);
    }

    #[test]
    fn test_macro_average() {
        // class a: tp=1 fp=1 fn=1 -> p=0.5 r=0.5 f=0.5
        // class b: tp=1 fp=1 fn=1 -> p=0.5 r=0.5 f=0.5
        let actual = s(&["a", "a", "b", "b"]);
        let predicted = s(&["a", "b", "b", "a"]);
        let m = ClassificationMetrics::from_predictions(&actual, &predicted).unwrap();
        assert!(approx(m.accuracy, 0.5));
        assert!(approx(m.precision, 0.5));
        assert!(approx(m.recall, 0.5));
        assert!(approx(m.f1_score, 0.5));
    }

    #[test]
    fn test_zero_division_counts_as_zero() {
        // class b is never predicted: p_b = 0, r_b = 0
        let actual = s(&["a", "b"]);
        let predicted = s(&["a", "a"]);
        let m = ClassificationMetrics::from_predictions(&actual, &predicted).unwrap();
        assert!(approx(m.accuracy, 0.5));
        assert!(approx(m.precision, 0.25));
        assert!(approx(m.recall, 0.5));
        assert!(approx(m.f1_score, (2.0 / 3.0) / 2.0));
    }

    #[test]
    fn test_empty_is_error() {
        assert!(matches!(
            ClassificationMetrics::from_predictions(&[], &[]),
            Err(ModelbenchError::Evaluation(_))
        ));
    }

    #[test]
    fn test_holdout_evaluator() {
        let train = Dataset::from_csv_str("x,y\n1,a\n2,a\n3,b\n").unwrap();
        let test = Dataset::from_csv_str("x,y\n5,a\n6,b\n").unwrap();
        let model = MajorityClassifier::fit(&train, "y").unwrap();
        let m = HoldoutEvaluator.evaluate(&model, "y", &test).unwrap();
        assert!(approx(m.accuracy, 0.5));
        assert_eq!(m.to_map().len(), 4);
        assert!(model.predict(&Record::new()).is_ok());
    }
}
