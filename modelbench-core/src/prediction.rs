//! Single-record prediction against a registered classifier.

use crate::data::Record;
use crate::error::{ModelbenchError, Result};
use crate::model::Classifier;
use crate::registry::ModelRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Predicted label for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub target_column: String,
    /// A label seen during training, as the original JSON value.
    pub value: Value,
}

/// Predict `target_column` for `record`.
///
/// A `target_column` key in `record` is ignored. Every feature the model reads
/// must be present and non-null.
pub fn classify_record(
    model: &dyn Classifier,
    record: &Record,
    target_column: &str,
) -> Result<Prediction> {
    let mut features = record.clone();
    features.remove(target_column);

    for column in model.feature_columns() {
        match features.get(&column) {
            None => {
                return Err(ModelbenchError::malformed_record(format!(
                    "record is missing feature '{column}'"
                )));
            }
            Some(Value::Null) => {
                return Err(ModelbenchError::malformed_record(format!(
                    "feature '{column}' is null"
                )));
            }
            Some(_) => {}
        }
    }

    let value = model.predict(&features)?;
    Ok(Prediction {
        target_column: target_column.to_string(),
        value,
    })
}

/// Loads models from the registry and classifies records with them.
#[derive(Debug, Clone)]
pub struct PredictionService {
    registry: ModelRegistry,
}

impl PredictionService {
    pub fn new(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    pub fn predict(&self, model_id: &str, record: &Record) -> Result<Prediction> {
        let metadata = self.registry.load_model_metadata(model_id)?;
        let model = self.registry.load_model(model_id)?;
        let prediction = classify_record(&model, record, &metadata.target_column)?;
        tracing::debug!(model_id, value = %prediction.value, "Record classified");
        Ok(prediction)
    }
}
