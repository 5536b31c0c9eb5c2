//! Benchmarking: rank every registered model by one stored metric.
//!
//! Every registered model must carry the requested metric; a single model
//! without it fails the whole benchmark with `MetricNotFound` rather than being
//! skipped. Ranking is descending by score, ties broken by ascending model id,
//! NaN scores last.

use crate::config::ModelbenchConfig;
use crate::error::{ModelbenchError, Result};
use crate::metadata::ClassifierMetadata;
use crate::persistence;
use crate::registry::ModelRegistry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

pub const REPORT_HEADER: [&str; 4] = ["model_id", "description", "metric", "score"];

/// One ranked line of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRow {
    pub model_id: String,
    pub description: String,
    pub metric: String,
    pub score: f64,
}

/// Ranked rows for one metric and the CSV file they were written to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub metric: String,
    pub rows: Vec<BenchmarkRow>,
    pub path: PathBuf,
}

impl BenchmarkReport {
    /// True when no models were registered at report time.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Highest-ranked row.
    pub fn best(&self) -> Option<&BenchmarkRow> {
        self.rows.first()
    }

    fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(REPORT_HEADER)?;
        for row in &self.rows {
            writer.write_record([
                row.model_id.as_str(),
                row.description.as_str(),
                row.metric.as_str(),
                row.score.to_string().as_str(),
            ])?;
        }
        writer
            .into_inner()
            .map_err(|e| ModelbenchError::storage(format!("failed to encode report: {e}")))
    }
}

/// Order `entries` by `metric`, failing if any entry lacks it.
pub fn rank_by_metric(
    entries: Vec<ClassifierMetadata>,
    metric: &str,
) -> Result<Vec<(ClassifierMetadata, f64)>> {
    let mut scored = entries
        .into_iter()
        .map(|meta| match meta.metric(metric) {
            Some(score) => Ok((meta, score)),
            None => Err(ModelbenchError::metric_not_found(metric, &meta.id)),
        })
        .collect::<Result<Vec<_>>>()?;

    scored.sort_by(|(a_meta, a), (b_meta, b)| {
        descending_nan_last(*a, *b).then_with(|| a_meta.id.cmp(&b_meta.id))
    });
    Ok(scored)
}

fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

fn validate_metric(metric: &str) -> Result<()> {
    let ok = !metric.is_empty()
        && metric
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !metric.starts_with('.');
    if ok {
        Ok(())
    } else {
        Err(ModelbenchError::invalid_metric(format!(
            "'{metric}' must be non-empty and use only letters, digits, '_', '-' or '.'"
        )))
    }
}

/// Ranks registered models and persists CSV reports.
#[derive(Debug, Clone)]
pub struct BenchmarkEngine {
    registry: ModelRegistry,
    reports_root: PathBuf,
}

impl BenchmarkEngine {
    pub fn new(registry: ModelRegistry, reports_root: impl Into<PathBuf>) -> Result<Self> {
        let reports_root = reports_root.into();
        if reports_root.as_os_str().is_empty() {
            return Err(ModelbenchError::configuration("reports root is empty"));
        }
        if reports_root.exists() && !reports_root.is_dir() {
            return Err(ModelbenchError::configuration(format!(
                "reports root {} exists but is not a directory",
                reports_root.display()
            )));
        }
        Ok(Self {
            registry,
            reports_root,
        })
    }

    pub fn from_config(registry: ModelRegistry, config: &ModelbenchConfig) -> Result<Self> {
        Self::new(registry, config.reports_root()?)
    }

    pub fn reports_root(&self) -> &Path {
        &self.reports_root
    }

    /// Where the report for `metric` is written.
    pub fn report_path(&self, metric: &str) -> PathBuf {
        self.reports_root.join(format!("benchmark_{metric}.csv"))
    }

    /// All registered models with their `metric` score, best first.
    pub fn make_benchmark(&self, metric: &str) -> Result<Vec<(ClassifierMetadata, f64)>> {
        let entries = self
            .registry
            .list_models_ids()?
            .iter()
            .map(|id| self.registry.load_model_metadata(id))
            .collect::<Result<Vec<_>>>()?;
        rank_by_metric(entries, metric)
    }

    /// Rank models by `metric`, write `benchmark_<metric>.csv` and return the ranking.
    /// With no registered models the report is empty and the CSV holds only the header.
    pub fn report_benchmark(&self, metric: &str) -> Result<BenchmarkReport> {
        validate_metric(metric)?;
        let rows = self
            .make_benchmark(metric)?
            .into_iter()
            .map(|(meta, score)| BenchmarkRow {
                model_id: meta.id,
                description: meta.description,
                metric: metric.to_string(),
                score,
            })
            .collect();

        let report = BenchmarkReport {
            metric: metric.to_string(),
            rows,
            path: self.report_path(metric),
        };
        persistence::atomic_write(&report.path, &report.to_csv()?)?;

        tracing::info!(
            metric,
            models = report.len(),
            path = %report.path.display(),
            "Benchmark report saved"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::metadata::{METRIC_ACCURACY, METRIC_F1_SCORE};
    use crate::model::{MajorityClassifier, ModelArtifact, TrainedClassifier};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn meta(id: &str, metrics: &[(&str, f64)]) -> ClassifierMetadata {
        let mut m = ClassifierMetadata::new(id, "y");
        m.description = format!("model {id}");
        for (k, v) in metrics {
            m.performance_metrics.insert(k.to_string(), *v);
        }
        m
    }

    fn engine(dir: &TempDir) -> BenchmarkEngine {
        let registry = ModelRegistry::new(dir.path().join("models")).unwrap();
        BenchmarkEngine::new(registry, dir.path().join("reports")).unwrap()
    }

    fn register(engine: &BenchmarkEngine, m: ClassifierMetadata) {
        let ds = Dataset::from_csv_str("x,y\n1,a\n").unwrap();
        let art = ModelArtifact::new(TrainedClassifier::Majority(
            MajorityClassifier::fit(&ds, "y").unwrap(),
        ));
        engine.registry.save(&art, &m).unwrap();
    }

    fn ids(ranked: &[(ClassifierMetadata, f64)]) -> Vec<&str> {
        ranked.iter().map(|(m, _)| m.id.as_str()).collect()
    }

    #[test]
    fn test_rank_descending_with_id_tiebreak() {
        let ranked = rank_by_metric(
            vec![
                meta("c", &[(METRIC_ACCURACY, 0.7)]),
                meta("b", &[(METRIC_ACCURACY, 0.9)]),
                meta("a", &[(METRIC_ACCURACY, 0.7)]),
                meta("d", &[(METRIC_ACCURACY, f64::NAN)]),
            ],
            METRIC_ACCURACY,
        )
        .unwrap();
        assert_eq!(ids(&ranked), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_missing_metric_fails() {
        let err = rank_by_metric(
            vec![
                meta("a", &[(METRIC_ACCURACY, 0.7)]),
                meta("b", &[(METRIC_F1_SCORE, 0.9)]),
            ],
            METRIC_ACCURACY,
        )
        .unwrap_err();
        match err {
            ModelbenchError::MetricNotFound { metric, model_id } => {
                assert_eq!(metric, METRIC_ACCURACY);
                assert_eq!(model_id, "b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_registry_report() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);

        let report = engine.report_benchmark(METRIC_ACCURACY).unwrap();
        assert!(report.is_empty());
        assert!(report.best().is_none());

        let csv = std::fs::read_to_string(&report.path).unwrap();
        assert_eq!(csv.trim(), "model_id,description,metric,score");
    }

    #[test]
    fn test_report_written_in_rank_order() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        register(&engine, meta("slow", &[(METRIC_ACCURACY, 0.6)]));
        register(&engine, meta("fast", &[(METRIC_ACCURACY, 0.95)]));

        let report = engine.report_benchmark(METRIC_ACCURACY).unwrap();
        assert_eq!(report.path, dir.path().join("reports").join("benchmark_accuracy.csv"));
        assert_eq!(report.best().unwrap().model_id, "fast");

        let csv = std::fs::read_to_string(&report.path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "model_id,description,metric,score",
                "fast,model fast,accuracy,0.95",
                "slow,model slow,accuracy,0.6",
            ]
        );
    }

    #[test]
    fn test_make_benchmark_is_repeatable() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        for (id, score) in [("m3", 0.5), ("m1", 0.5), ("m2", 0.8)] {
            register(&engine, meta(id, &[(METRIC_ACCURACY, score)]));
        }
        let first = engine.make_benchmark(METRIC_ACCURACY).unwrap();
        let second = engine.make_benchmark(METRIC_ACCURACY).unwrap();
        assert_eq!(first, second);
        assert_eq!(ids(&first), vec!["m2", "m1", "m3"]);
    }

    #[test]
    fn test_invalid_metric_name() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        for metric in ["", "../x", ".hidden", "a b"] {
            assert!(matches!(
                engine.report_benchmark(metric),
                Err(ModelbenchError::InvalidMetric(_))
            ));
        }
    }

    #[test]
    fn test_reports_root_must_be_configured() {
        let dir = TempDir::new().unwrap();
        let registry = ModelRegistry::new(dir.path()).unwrap();
        assert!(matches!(
            BenchmarkEngine::from_config(registry, &ModelbenchConfig::default()),
            Err(ModelbenchError::Configuration(_))
        ));
    }
}
