//! Classifiers: the capability trait, feature encoding and the concrete algorithms.

pub mod artifact;
pub mod baseline;
pub mod features;
pub mod tree;

pub use artifact::{ARTIFACT_FORMAT_VERSION, ModelArtifact, TrainedClassifier};
pub use baseline::MajorityClassifier;
pub use features::{FeatureEncoder, FeatureKind, FeatureSpec, LabelSpace};
pub use tree::{DecisionTreeClassifier, TreeNode, TreeParams};

use crate::data::Record;
use crate::error::Result;
use serde_json::Value;

/// A fitted classifier that can label single records.
pub trait Classifier: Send + Sync {
    /// Predict the target value for `record`. Keys naming the target column are ignored.
    fn predict(&self, record: &Record) -> Result<Value>;

    /// Every label the classifier can return.
    fn labels(&self) -> &[Value];

    /// Columns the classifier reads from a record.
    fn feature_columns(&self) -> Vec<String>;
}
