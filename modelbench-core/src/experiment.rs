//! Experiment pipeline: ingest → split → train → evaluate → register.
//!
//! The registry is written only after every earlier step has succeeded, so a
//! failed experiment leaves it exactly as it was. Nothing is retried; callers
//! re-run a failed experiment themselves.

use crate::config::ModelbenchConfig;
use crate::data::{CsvUrlLoader, Dataset, DatasetLoader, SplitPolicy, train_test_split};
use crate::error::{ModelbenchError, Result};
use crate::evaluation::{Evaluator, HoldoutEvaluator};
use crate::metadata::ClassifierMetadata;
use crate::registry::{ModelRegistry, validate_model_id};
use crate::training::{ConfiguredTrainer, Trainer};
use std::sync::Arc;

/// Description attached to models produced from `input_url`.
pub fn describe_source(input_url: &str) -> String {
    format!("Classifier created with data from {input_url}")
}

/// Runs experiments against one registry with pluggable collaborators.
#[derive(Clone)]
pub struct ExperimentRunner {
    registry: ModelRegistry,
    split: SplitPolicy,
    loader: Arc<dyn DatasetLoader>,
    trainer: Arc<dyn Trainer>,
    evaluator: Arc<dyn Evaluator>,
}

impl ExperimentRunner {
    /// Runner with the default CSV loader, decision tree trainer and holdout evaluator.
    pub fn new(registry: ModelRegistry, split: SplitPolicy) -> Self {
        Self {
            registry,
            split,
            loader: Arc::new(CsvUrlLoader::new()),
            trainer: Arc::new(ConfiguredTrainer::default()),
            evaluator: Arc::new(HoldoutEvaluator),
        }
    }

    pub fn from_config(registry: ModelRegistry, config: &ModelbenchConfig) -> Self {
        let split = SplitPolicy {
            test_fraction: config.experiment.test_fraction,
            seed: config.experiment.split_seed,
        };
        Self::new(registry, split)
            .with_trainer(Arc::new(ConfiguredTrainer::new(config.training.clone())))
    }

    pub fn with_loader(mut self, loader: Arc<dyn DatasetLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_trainer(mut self, trainer: Arc<dyn Trainer>) -> Self {
        self.trainer = trainer;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Train a classifier for `target_column` on the data at `input_url`,
    /// evaluate it on a held-out split and register it as `model_id`.
    pub async fn run_experiment(
        &self,
        input_url: &str,
        target_column: &str,
        model_id: &str,
    ) -> Result<ClassifierMetadata> {
        validate_model_id(model_id)?;

        let mut dataset = self.loader.load(input_url).await?;
        if dataset.column_index(target_column).is_none() {
            return Err(ModelbenchError::data_source(format!(
                "target column '{target_column}' not found in {input_url} (columns: {})",
                dataset.columns.join(", ")
            )));
        }
        let categorical = dataset.unify_column_kinds();
        if !categorical.is_empty() {
            tracing::debug!(model_id, columns = ?categorical, "Mixed columns treated as categorical");
        }
        tracing::debug!(model_id, rows = dataset.len(), "Dataset ingested");

        let (train, test) = train_test_split(&dataset, &self.split)?;
        tracing::debug!(
            model_id,
            train_rows = train.len(),
            test_rows = test.len(),
            seed = self.split.seed,
            "Dataset split"
        );

        // Fitting and the registry write are CPU and filesystem bound.
        let fit = FitJob {
            registry: self.registry.clone(),
            trainer: Arc::clone(&self.trainer),
            evaluator: Arc::clone(&self.evaluator),
            target_column: target_column.to_string(),
            model_id: model_id.to_string(),
            description: describe_source(input_url),
        };
        tokio::task::spawn_blocking(move || fit.run(&train, &test))
            .await
            .map_err(|e| ModelbenchError::training(format!("experiment task failed: {e}")))?
    }
}

/// Train, evaluate and register one model off the async runtime.
struct FitJob {
    registry: ModelRegistry,
    trainer: Arc<dyn Trainer>,
    evaluator: Arc<dyn Evaluator>,
    target_column: String,
    model_id: String,
    description: String,
}

impl FitJob {
    fn run(self, train: &Dataset, test: &Dataset) -> Result<ClassifierMetadata> {
        let model_id = self.model_id.as_str();
        let (artifact, mut metadata) = self.trainer.train(train, &self.target_column, model_id)?;
        if metadata.id != model_id {
            return Err(ModelbenchError::training(format!(
                "trainer returned metadata for '{}' instead of '{model_id}'",
                metadata.id
            )));
        }

        let metrics = self.evaluator.evaluate(&artifact, &self.target_column, test)?;
        metadata.performance_metrics = metrics.to_map();
        metadata.description = self.description;

        self.registry.save(&artifact, &metadata)?;

        tracing::info!(
            model_id,
            accuracy = metrics.accuracy,
            f1_score = metrics.f1_score,
            "Experiment completed"
        );
        Ok(metadata)
    }
}
