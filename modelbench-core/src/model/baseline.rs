//! Majority-class baseline.

use crate::data::{Dataset, Record};
use crate::error::{ModelbenchError, Result};
use crate::model::Classifier;
use crate::model::features::LabelSpace;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Always predicts the most frequent training label. Ignores record contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorityClassifier {
    pub target_column: String,
    pub labels: LabelSpace,
    pub class: usize,
}

impl MajorityClassifier {
    pub fn fit(dataset: &Dataset, target_column: &str) -> Result<Self> {
        if dataset.is_empty() {
            return Err(ModelbenchError::training("cannot fit on zero rows"));
        }
        let (labels, classes) = LabelSpace::fit(dataset, target_column)?;
        let mut counts = vec![0usize; labels.len()];
        for c in classes {
            counts[c] += 1;
        }
        // ties resolve to the lowest class index
        let class = counts
            .iter()
            .enumerate()
            .fold(0, |best, (c, &n)| if n > counts[best] { c } else { best });
        Ok(Self {
            target_column: target_column.to_string(),
            labels,
            class,
        })
    }
}

impl Classifier for MajorityClassifier {
    fn predict(&self, _record: &Record) -> Result<Value> {
        self.labels
            .label(self.class)
            .cloned()
            .ok_or_else(|| ModelbenchError::storage("corrupt majority classifier"))
    }

    fn labels(&self) -> &[Value] {
        &self.labels.labels
    }

    fn feature_columns(&self) -> Vec<String> {
        Vec::new()
    }
}
