//! Feature and label encoding shared by the classifiers.
//!
//! Numeric columns pass through as `f64`. Any column holding a non-numeric
//! value is categorical: its values are mapped to their index in a sorted
//! vocabulary, and unseen categories map to one past the end. Missing cells
//! (`null`) encode as `NaN` and always take the right branch of a split.

use crate::data::{Dataset, Record};
use crate::error::{ModelbenchError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Stable string key for a cell value.
pub fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    Categorical { categories: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureSpec {
    fn encode(&self, value: &Value) -> Result<f64> {
        if value.is_null() {
            return Ok(f64::NAN);
        }
        match &self.kind {
            FeatureKind::Numeric => match value {
                Value::Number(n) => n.as_f64().ok_or_else(|| self.not_numeric(value)),
                Value::String(s) => s.trim().parse::<f64>().map_err(|_| self.not_numeric(value)),
                _ => Err(self.not_numeric(value)),
            },
            FeatureKind::Categorical { categories } => {
                let key = value_key(value);
                let idx = categories
                    .binary_search(&key)
                    .unwrap_or(categories.len());
                Ok(idx as f64)
            }
        }
    }

    fn not_numeric(&self, value: &Value) -> ModelbenchError {
        ModelbenchError::malformed_record(format!(
            "feature '{}' expects a number, got {value}",
            self.name
        ))
    }
}

/// Maps records onto the numeric feature vectors a classifier consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    pub features: Vec<FeatureSpec>,
}

impl FeatureEncoder {
    /// Infer one feature per non-target column of `dataset`.
    pub fn fit(dataset: &Dataset, target_column: &str) -> Result<Self> {
        let mut features = Vec::new();
        for (idx, name) in dataset.columns.iter().enumerate() {
            if name == target_column {
                continue;
            }
            let values = dataset.rows.iter().map(|row| &row[idx]);
            let numeric = values.clone().all(|v| v.is_null() || v.is_number());
            let kind = if numeric {
                FeatureKind::Numeric
            } else {
                let categories: BTreeSet<String> =
                    values.filter(|v| !v.is_null()).map(value_key).collect();
                FeatureKind::Categorical {
                    categories: categories.into_iter().collect(),
                }
            };
            features.push(FeatureSpec {
                name: name.clone(),
                kind,
            });
        }
        Ok(Self { features })
    }

    pub fn names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Encode every row of a dataset that carries the same columns the encoder was fit on.
    pub fn encode_dataset(&self, dataset: &Dataset) -> Result<Vec<Vec<f64>>> {
        let positions = self
            .features
            .iter()
            .map(|f| {
                dataset.column_index(&f.name).ok_or_else(|| {
                    ModelbenchError::data_source(format!("dataset is missing column '{}'", f.name))
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        dataset
            .rows
            .iter()
            .map(|row| {
                self.features
                    .iter()
                    .zip(&positions)
                    .map(|(spec, &pos)| spec.encode(&row[pos]))
                    .collect()
            })
            .collect()
    }

    /// Encode a single record; absent features are a malformed record.
    pub fn encode_record(&self, record: &Record) -> Result<Vec<f64>> {
        self.features
            .iter()
            .map(|spec| {
                let value = record.get(&spec.name).ok_or_else(|| {
                    ModelbenchError::malformed_record(format!(
                        "record is missing feature '{}'",
                        spec.name
                    ))
                })?;
                spec.encode(value)
            })
            .collect()
    }
}

/// The distinct target values seen during training, in sorted key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSpace {
    pub labels: Vec<Value>,
}

impl LabelSpace {
    /// Collect labels from `target_column` and return them with the per-row class index.
    pub fn fit(dataset: &Dataset, target_column: &str) -> Result<(Self, Vec<usize>)> {
        let values = dataset.column_values(target_column).ok_or_else(|| {
            ModelbenchError::training(format!("target column '{target_column}' not in dataset"))
        })?;
        if let Some(row) = values.iter().position(|v| v.is_null()) {
            return Err(ModelbenchError::training(format!(
                "target column '{target_column}' is empty in row {}",
                row + 1
            )));
        }

        let mut by_key: BTreeMap<String, Value> = BTreeMap::new();
        for v in &values {
            by_key.entry(value_key(v)).or_insert_with(|| (*v).clone());
        }
        let keys: Vec<String> = by_key.keys().cloned().collect();
        let classes = values
            .iter()
            .map(|v| keys.binary_search(&value_key(v)).unwrap_or_default())
            .collect();

        Ok((
            Self {
                labels: by_key.into_values().collect(),
            },
            classes,
        ))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, class: usize) -> Option<&Value> {
        self.labels.get(class)
    }
}
