//! Configuration for modelbench.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment. The core never reads the environment
//! itself; binaries call [`load_config`] once at startup and pass the result into
//! the registry and benchmark constructors.

use crate::error::{ModelbenchError, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the workspace-local configuration file.
pub const WORKSPACE_CONFIG_FILE: &str = "modelbench.toml";

/// Prefix for environment overrides (`MODELBENCH_MODELS_ROOT`, `MODELBENCH_TRAINING__MAX_DEPTH`, ...).
pub const ENV_PREFIX: &str = "MODELBENCH_";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelbenchConfig {
    /// Root directory of the model registry.
    #[serde(default)]
    pub models_root: Option<PathBuf>,
    /// Root directory for benchmark reports.
    #[serde(default)]
    pub reports_root: Option<PathBuf>,
    #[serde(default)]
    pub experiment: ExperimentConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl ModelbenchConfig {
    /// Registry root, or a configuration error when unset.
    pub fn models_root(&self) -> Result<&Path> {
        self.models_root.as_deref().ok_or_else(|| {
            ModelbenchError::configuration(format!(
                "models root is not set; set {ENV_PREFIX}MODELS_ROOT to the directory where models should be stored"
            ))
        })
    }

    /// Reports root, or a configuration error when unset.
    pub fn reports_root(&self) -> Result<&Path> {
        self.reports_root.as_deref().ok_or_else(|| {
            ModelbenchError::configuration(format!(
                "reports root is not set; set {ENV_PREFIX}REPORTS_ROOT to the directory where reports should be stored"
            ))
        })
    }
}

/// Experiment pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Fraction of rows held out for evaluation.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    /// Seed for the train/test shuffle.
    #[serde(default = "default_split_seed")]
    pub split_seed: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            test_fraction: default_test_fraction(),
            split_seed: default_split_seed(),
        }
    }
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_split_seed() -> u64 {
    42
}

/// Classification algorithm used by the default trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    DecisionTree,
    Majority,
}

/// Training configuration for the default trainer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Maximum decision tree depth.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Minimum number of training rows in each leaf.
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// Maximum candidate thresholds evaluated per numeric feature and node.
    #[serde(default = "default_max_thresholds")]
    pub max_thresholds: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            max_depth: default_max_depth(),
            min_samples_leaf: default_min_samples_leaf(),
            max_thresholds: default_max_thresholds(),
        }
    }
}

fn default_max_depth() -> usize {
    8
}

fn default_min_samples_leaf() -> usize {
    1
}

fn default_max_thresholds() -> usize {
    32
}

/// HTTP surface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `MODELBENCH_`, nested keys split on `__`)
/// 2. Explicit config file, if given
/// 3. Workspace-local config (`modelbench.toml`)
/// 4. User config (`~/.config/modelbench/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
) -> std::result::Result<ModelbenchConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(ModelbenchConfig::default()));

    if let Some(dirs) = directories::ProjectDirs::from("dev", "modelbench", "modelbench") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(WORKSPACE_CONFIG_FILE);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

    figment.extract().map_err(Box::new)
}
