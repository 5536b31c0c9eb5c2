//! Seeded train/test splitting.

use crate::data::dataset::Dataset;
use crate::error::{ModelbenchError, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// How rows are divided between training and evaluation.
///
/// Row indices are shuffled with a `StdRng` seeded from `seed`; the first
/// `ceil(test_fraction * n)` shuffled rows form the test set. Both halves keep
/// the dataset's original row order, so the same dataset and seed always give
/// the same split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitPolicy {
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Split `dataset` into `(train, test)`.
pub fn train_test_split(dataset: &Dataset, policy: &SplitPolicy) -> Result<(Dataset, Dataset)> {
    if !(policy.test_fraction > 0.0 && policy.test_fraction < 1.0) {
        return Err(ModelbenchError::configuration(format!(
            "test fraction must be strictly between 0 and 1, got {}",
            policy.test_fraction
        )));
    }
    let n = dataset.len();
    if n < 2 {
        return Err(ModelbenchError::data_source(format!(
            "dataset needs at least 2 rows to split, got {n}"
        )));
    }

    let n_test = ((n as f64 * policy.test_fraction).ceil() as usize).clamp(1, n - 1);

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(policy.seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at_mut(n_test);
    test_idx.sort_unstable();
    train_idx.sort_unstable();

    Ok((dataset.select_rows(train_idx), dataset.select_rows(test_idx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numbered(n: usize) -> Dataset {
        Dataset::new(
            vec!["id".into()],
            (0..n).map(|i| vec![json!(i)]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_split_sizes() {
        let (train, test) = train_test_split(&numbered(100), &SplitPolicy::default()).unwrap();
        assert_eq!(test.len(), 20);
        assert_eq!(train.len(), 80);

        let (train, test) = train_test_split(&numbered(7), &SplitPolicy::default()).unwrap();
        assert_eq!(test.len(), 2);
        assert_eq!(train.len(), 5);
    }

    #[test]
    fn test_split_is_a_partition() {
        let ds = numbered(50);
        let (train, test) = train_test_split(&ds, &SplitPolicy::default()).unwrap();
        let mut all: Vec<i64> = train
            .rows
            .iter()
            .chain(test.rows.iter())
            .map(|r| r[0].as_i64().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<i64>>());
    }

    #[test]
    fn test_split_reproducible_for_seed() {
        let ds = numbered(40);
        let policy = SplitPolicy {
            test_fraction: 0.25,
            seed: 7,
        };
        let a = train_test_split(&ds, &policy).unwrap();
        let b = train_test_split(&ds, &policy).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_rejects_tiny_dataset_and_bad_fraction() {
        assert!(matches!(
            train_test_split(&numbered(1), &SplitPolicy::default()),
            Err(ModelbenchError::DataSource(_))
        ));
        let bad = SplitPolicy {
            test_fraction: 1.0,
            seed: 1,
        };
        assert!(matches!(
            train_test_split(&numbered(10), &bad),
            Err(ModelbenchError::Configuration(_))
        ));
    }
}
