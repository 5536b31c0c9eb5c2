//! Training: fit a classifier on a dataset and describe it with fresh metadata.

use crate::config::{Algorithm, TrainingConfig};
use crate::data::Dataset;
use crate::error::{ModelbenchError, Result};
use crate::metadata::ClassifierMetadata;
use crate::model::{
    Classifier, DecisionTreeClassifier, MajorityClassifier, ModelArtifact, TrainedClassifier,
    TreeParams,
};

/// Fits a classifier for `target_column` on a training subset.
pub trait Trainer: Send + Sync {
    fn train(
        &self,
        train: &Dataset,
        target_column: &str,
        model_id: &str,
    ) -> Result<(ModelArtifact, ClassifierMetadata)>;
}

/// Trainer driven by [`TrainingConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfiguredTrainer {
    config: TrainingConfig,
}

impl ConfiguredTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.config.max_depth,
            min_samples_leaf: self.config.min_samples_leaf,
            max_thresholds: self.config.max_thresholds,
        }
    }
}

impl Trainer for ConfiguredTrainer {
    fn train(
        &self,
        train: &Dataset,
        target_column: &str,
        model_id: &str,
    ) -> Result<(ModelArtifact, ClassifierMetadata)> {
        if train.column_index(target_column).is_none() {
            return Err(ModelbenchError::training(format!(
                "target column '{target_column}' not in training data"
            )));
        }

        let classifier = match self.config.algorithm {
            Algorithm::DecisionTree => TrainedClassifier::DecisionTree(
                DecisionTreeClassifier::fit(train, target_column, self.tree_params())?,
            ),
            Algorithm::Majority => {
                TrainedClassifier::Majority(MajorityClassifier::fit(train, target_column)?)
            }
        };
        let artifact = ModelArtifact::new(classifier);

        let metadata = ClassifierMetadata::new(model_id, target_column)
            .with_algorithm(artifact.algorithm())
            .with_feature_columns(artifact.feature_columns());

        tracing::debug!(
            model_id,
            algorithm = artifact.algorithm(),
            rows = train.len(),
            "Trained classifier"
        );
        Ok((artifact, metadata))
    }
}
