//! CART decision tree classifier.
//!
//! Exact-greedy construction on Gini impurity. Candidate thresholds are
//! midpoints between consecutive distinct values, thinned to at most
//! `max_thresholds` evenly spaced candidates per feature and node. Splits are
//! scanned in feature order then ascending threshold, and only a strictly
//! better gain replaces the current best, so a given dataset always yields the
//! same tree.

use crate::data::{Dataset, Record};
use crate::error::{ModelbenchError, Result};
use crate::model::Classifier;
use crate::model::features::{FeatureEncoder, LabelSpace};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MIN_GAIN: f64 = 1e-12;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub max_thresholds: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 8,
            min_samples_leaf: 1,
            max_thresholds: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        class: usize,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    pub target_column: String,
    pub params: TreeParams,
    pub encoder: FeatureEncoder,
    pub labels: LabelSpace,
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Builder<'a> {
    params: TreeParams,
    features: &'a [Vec<f64>],
    classes: &'a [usize],
    n_classes: usize,
}

impl DecisionTreeClassifier {
    pub fn fit(dataset: &Dataset, target_column: &str, params: TreeParams) -> Result<Self> {
        if dataset.is_empty() {
            return Err(ModelbenchError::training("cannot fit a tree on zero rows"));
        }
        if params.max_thresholds == 0 || params.min_samples_leaf == 0 {
            return Err(ModelbenchError::training(
                "max_thresholds and min_samples_leaf must be at least 1",
            ));
        }
        let (labels, classes) = LabelSpace::fit(dataset, target_column)?;
        let encoder = FeatureEncoder::fit(dataset, target_column)?;
        let features = encoder.encode_dataset(dataset)?;

        let builder = Builder {
            params,
            features: &features,
            classes: &classes,
            n_classes: labels.len(),
        };
        let mut nodes = Vec::new();
        let indices: Vec<usize> = (0..features.len()).collect();
        builder.build_node(&indices, 0, &mut nodes);

        tracing::debug!(
            target_column,
            nodes = nodes.len(),
            classes = labels.len(),
            "Fitted decision tree"
        );

        Ok(Self {
            target_column: target_column.to_string(),
            params,
            encoder,
            labels,
            nodes,
        })
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(TreeNode::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    fn predict_class(&self, x: &[f64]) -> Result<usize> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { class, .. }) => return Ok(*class),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = x.get(*feature).ok_or_else(|| {
                        ModelbenchError::storage(format!(
                            "corrupt decision tree: node {idx} splits on feature {feature}, \
                             but records have {} features",
                            x.len()
                        ))
                    })?;
                    idx = if *value <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => {
                    return Err(ModelbenchError::storage(format!(
                        "corrupt decision tree: node {idx} does not exist"
                    )));
                }
            }
        }
    }
}

impl Classifier for DecisionTreeClassifier {
    fn predict(&self, record: &Record) -> Result<Value> {
        let x = self.encoder.encode_record(record)?;
        let class = self.predict_class(&x)?;
        self.labels
            .label(class)
            .cloned()
            .ok_or_else(|| ModelbenchError::storage(format!("corrupt decision tree: class {class}")))
    }

    fn labels(&self) -> &[Value] {
        &self.labels.labels
    }

    fn feature_columns(&self) -> Vec<String> {
        self.encoder.names()
    }
}

impl Builder<'_> {
    fn build_node(&self, indices: &[usize], depth: usize, nodes: &mut Vec<TreeNode>) -> usize {
        let current = nodes.len();
        let counts = self.class_counts(indices);
        let leaf = TreeNode::Leaf {
            class: majority_class(&counts),
            samples: indices.len(),
        };

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if pure
            || depth >= self.params.max_depth
            || indices.len() < 2 * self.params.min_samples_leaf
        {
            nodes.push(leaf);
            return current;
        }

        let Some(split) = self.find_best_split(indices, &counts) else {
            nodes.push(leaf);
            return current;
        };

        let (left_idx, right_idx) = self.partition(indices, split.feature, split.threshold);

        nodes.push(TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: 0,
            right: 0,
        });
        let left = self.build_node(&left_idx, depth + 1, nodes);
        let right = self.build_node(&right_idx, depth + 1, nodes);
        if let TreeNode::Split {
            left: l, right: r, ..
        } = &mut nodes[current]
        {
            *l = left;
            *r = right;
        }
        current
    }

    fn find_best_split(&self, indices: &[usize], counts: &[usize]) -> Option<SplitCandidate> {
        let parent = gini(counts, indices.len());
        let feature_count = self.features.first().map_or(0, |row| row.len());
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..feature_count {
            for threshold in self.thresholds(indices, feature) {
                let mut left = vec![0usize; self.n_classes];
                let mut right = vec![0usize; self.n_classes];
                for &i in indices {
                    if self.features[i][feature] <= threshold {
                        left[self.classes[i]] += 1;
                    } else {
                        right[self.classes[i]] += 1;
                    }
                }
                let n_left: usize = left.iter().sum();
                let n_right = indices.len() - n_left;
                if n_left < self.params.min_samples_leaf || n_right < self.params.min_samples_leaf {
                    continue;
                }

                let n = indices.len() as f64;
                let weighted = (n_left as f64 / n) * gini(&left, n_left)
                    + (n_right as f64 / n) * gini(&right, n_right);
                let gain = parent - weighted;
                if gain > MIN_GAIN && best.is_none_or(|b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }
        best
    }

    fn thresholds(&self, indices: &[usize], feature: usize) -> Vec<f64> {
        let mut values: Vec<f64> = indices
            .iter()
            .map(|&i| self.features[i][feature])
            .filter(|v| !v.is_nan())
            .collect();
        values.sort_by(f64::total_cmp);
        values.dedup();

        let midpoints: Vec<f64> = values.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
        let k = self.params.max_thresholds;
        if midpoints.len() <= k {
            return midpoints;
        }
        let mut picked: Vec<f64> = (0..k)
            .map(|j| midpoints[(j * midpoints.len() + midpoints.len() / 2) / k])
            .collect();
        picked.dedup();
        picked
    }

    fn partition(&self, indices: &[usize], feature: usize, threshold: f64) -> (Vec<usize>, Vec<usize>) {
        indices
            .iter()
            .partition(|&&i| self.features[i][feature] <= threshold)
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[self.classes[i]] += 1;
        }
        counts
    }
}

/// Most frequent class; ties go to the lowest class index.
fn majority_class(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn separable() -> Dataset {
        let mut csv = String::from("x,color,label\n");
        for i in 0..40 {
            let (color, label) = if i < 20 { ("red", "low") } else { ("blue", "high") };
            csv.push_str(&format!("{i},{color},{label}\n"));
        }
        Dataset::from_csv_str(&csv).unwrap()
    }

    fn record(x: f64, color: &str) -> Record {
        let mut r = Record::new();
        r.insert("x".into(), json!(x));
        r.insert("color".into(), json!(color));
        r
    }

    #[test]
    fn test_fits_separable_data() {
        let tree = DecisionTreeClassifier::fit(&separable(), "label", TreeParams::default()).unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(&record(3.0, "red")).unwrap(), json!("low"));
        assert_eq!(tree.predict(&record(35.0, "blue")).unwrap(), json!("high"));
        assert_eq!(tree.labels(), &[json!("high"), json!("low")]);
    }

    #[test]
    fn test_split_on_unknown_feature_is_storage_error() {
        let mut tree =
            DecisionTreeClassifier::fit(&separable(), "label", TreeParams::default()).unwrap();
        for node in &mut tree.nodes {
            if let TreeNode::Split { feature, .. } = node {
                *feature = 99;
            }
        }
        let err = tree.predict(&record(3.0, "red")).unwrap_err();
        assert!(matches!(err, ModelbenchError::Storage(_)));
        assert!(err.to_string().contains("feature 99"));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let ds = separable();
        let a = DecisionTreeClassifier::fit(&ds, "label", TreeParams::default()).unwrap();
        let b = DecisionTreeClassifier::fit(&ds, "label", TreeParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_max_depth_zero_is_majority_leaf() {
        let params = TreeParams {
            max_depth: 0,
            ..TreeParams::default()
        };
        let tree = DecisionTreeClassifier::fit(&separable(), "label", params).unwrap();
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(
            tree.nodes[0],
            TreeNode::Leaf {
                class: 0,
                samples: 40
            }
        );
    }

    #[test]
    fn test_conjunction_needs_depth_two() {
        let mut csv = String::from("a,b,y\n");
        for _ in 0..5 {
            csv.push_str("0,0,0\n0,1,0\n1,0,0\n1,1,1\n");
        }
        let ds = Dataset::from_csv_str(&csv).unwrap();
        let tree = DecisionTreeClassifier::fit(&ds, "y", TreeParams::default()).unwrap();
        assert_eq!(tree.depth(), 2);
        for (a, b, y) in [(0, 0, 0), (0, 1, 0), (1, 0, 0), (1, 1, 1)] {
            let mut r = Record::new();
            r.insert("a".into(), json!(a));
            r.insert("b".into(), json!(b));
            assert_eq!(tree.predict(&r).unwrap(), json!(y));
        }
    }

    #[test]
    fn test_missing_feature_is_malformed() {
        let tree = DecisionTreeClassifier::fit(&separable(), "label", TreeParams::default()).unwrap();
        let mut r = Record::new();
        r.insert("x".into(), json!(1));
        assert!(matches!(
            tree.predict(&r),
            Err(ModelbenchError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_gini_and_majority() {
        assert_eq!(gini(&[5, 5], 10), 0.5);
        assert_eq!(gini(&[10, 0], 10), 0.0);
        assert_eq!(majority_class(&[3, 7, 7]), 1);
    }
}
