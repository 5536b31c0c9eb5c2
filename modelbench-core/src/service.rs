//! The operations exposed to the CLI and HTTP surfaces, bundled over one registry.

use crate::benchmark::{BenchmarkEngine, BenchmarkReport};
use crate::config::{ENV_PREFIX, ModelbenchConfig};
use crate::data::Record;
use crate::error::{ModelbenchError, Result};
use crate::experiment::ExperimentRunner;
use crate::metadata::ClassifierMetadata;
use crate::model::ModelArtifact;
use crate::prediction::{Prediction, PredictionService};
use crate::registry::ModelRegistry;

#[derive(Clone)]
pub struct ModelService {
    registry: ModelRegistry,
    runner: ExperimentRunner,
    predictions: PredictionService,
    benchmark: Option<BenchmarkEngine>,
}

impl ModelService {
    /// Build every component from `config`.
    ///
    /// The models root is required. Without a reports root the service still
    /// starts, and only [`ModelService::report_benchmark`] fails.
    pub fn from_config(config: &ModelbenchConfig) -> Result<Self> {
        let registry = ModelRegistry::from_config(config)?;
        let runner = ExperimentRunner::from_config(registry.clone(), config);
        let benchmark = match config.reports_root {
            Some(_) => Some(BenchmarkEngine::from_config(registry.clone(), config)?),
            None => None,
        };
        Ok(Self::new(registry, runner, benchmark))
    }

    pub fn new(
        registry: ModelRegistry,
        runner: ExperimentRunner,
        benchmark: Option<BenchmarkEngine>,
    ) -> Self {
        Self {
            predictions: PredictionService::new(registry.clone()),
            registry,
            runner,
            benchmark,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn list_models_ids(&self) -> Result<Vec<String>> {
        self.registry.list_models_ids()
    }

    pub fn load_model(&self, id: &str) -> Result<ModelArtifact> {
        self.registry.load_model(id)
    }

    pub fn load_model_metadata(&self, id: &str) -> Result<ClassifierMetadata> {
        self.registry.load_model_metadata(id)
    }

    pub fn predict(&self, model_id: &str, record: &Record) -> Result<Prediction> {
        self.predictions.predict(model_id, record)
    }

    pub async fn run_experiment(
        &self,
        input_url: &str,
        target_column: &str,
        model_id: &str,
    ) -> Result<ClassifierMetadata> {
        self.runner
            .run_experiment(input_url, target_column, model_id)
            .await
    }

    pub fn make_benchmark(&self, metric: &str) -> Result<Vec<(ClassifierMetadata, f64)>> {
        self.benchmark()?.make_benchmark(metric)
    }

    pub fn report_benchmark(&self, metric: &str) -> Result<BenchmarkReport> {
        self.benchmark()?.report_benchmark(metric)
    }

    fn benchmark(&self) -> Result<&BenchmarkEngine> {
        self.benchmark.as_ref().ok_or_else(|| {
            ModelbenchError::configuration(format!(
                "reports root is not set; set {ENV_PREFIX}REPORTS_ROOT to enable benchmark reports"
            ))
        })
    }
}
