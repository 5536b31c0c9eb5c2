//! # modelbench-core
//!
//! Registry, experiment pipeline, benchmarking and prediction for tabular
//! classifiers.
//!
//! - [`registry`] stores (artifact, metadata) pairs on the filesystem with
//!   atomic replacement.
//! - [`experiment`] ingests a CSV dataset, splits it, trains and evaluates a
//!   classifier and registers the result.
//! - [`benchmark`] ranks registered models by one metric and writes a CSV report.
//! - [`prediction`] classifies a single record with a registered model.
//! - [`service`] bundles the above behind one facade for the binaries.
//! - [`gateway`] exposes the service over HTTP.

pub mod benchmark;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod experiment;
pub mod gateway;
pub mod metadata;
pub mod model;
pub mod persistence;
pub mod prediction;
pub mod registry;
pub mod service;
pub mod training;

pub use benchmark::{BenchmarkEngine, BenchmarkReport, BenchmarkRow, rank_by_metric};
pub use config::{ModelbenchConfig, load_config};
pub use data::{CsvUrlLoader, Dataset, DatasetLoader, Record, SplitPolicy};
pub use error::{ModelbenchError, Result};
pub use evaluation::{ClassificationMetrics, Evaluator, HoldoutEvaluator};
pub use experiment::ExperimentRunner;
pub use metadata::ClassifierMetadata;
pub use model::{Classifier, ModelArtifact};
pub use prediction::{Prediction, PredictionService, classify_record};
pub use registry::{ModelRegistry, validate_model_id};
pub use service::ModelService;
pub use training::{ConfiguredTrainer, Trainer};
