//! Tabular data: in-memory datasets, CSV ingestion and train/test splitting.

pub mod dataset;
pub mod source;
pub mod split;

pub use dataset::{Dataset, Record};
pub use source::{CsvUrlLoader, DatasetLoader};
pub use split::{SplitPolicy, train_test_split};
