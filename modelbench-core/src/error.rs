//! Error types for the modelbench-core crate.

use thiserror::Error;

/// Top-level error type for registry, experiment, benchmark and prediction operations.
#[derive(Debug, Error)]
pub enum ModelbenchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Metric '{metric}' not found for model '{model_id}'")]
    MetricNotFound { metric: String, model_id: String },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Invalid model id: {0}")]
    InvalidModelId(String),

    #[error("Invalid metric name: {0}")]
    InvalidMetric(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ModelbenchError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn data_source(msg: impl Into<String>) -> Self {
        Self::DataSource(msg.into())
    }

    pub fn metric_not_found(metric: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self::MetricNotFound {
            metric: metric.into(),
            model_id: model_id.into(),
        }
    }

    pub fn malformed_record(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }

    pub fn invalid_model_id(msg: impl Into<String>) -> Self {
        Self::InvalidModelId(msg.into())
    }

    pub fn invalid_metric(msg: impl Into<String>) -> Self {
        Self::InvalidMetric(msg.into())
    }

    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether the caller can fix this by changing its input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::MetricNotFound { .. }
                | Self::MalformedRecord(_)
                | Self::InvalidModelId(_)
                | Self::InvalidMetric(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ModelbenchError>;
