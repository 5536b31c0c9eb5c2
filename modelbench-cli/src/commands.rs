//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use anyhow::Context;
use modelbench_core::config::{ModelbenchConfig, WORKSPACE_CONFIG_FILE, load_config};
use modelbench_core::gateway::{self, METRIC_LABELS, NO_MODELS_MESSAGE, metrics_summary};
use modelbench_core::{ModelService, Record};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    let output = execute(command, workspace, config_file).await?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// Run a command and return what it prints.
async fn execute(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<String> {
    match command {
        Commands::Config { action } => handle_config(action, workspace, config_file),
        Commands::Models => {
            let service = open_service(workspace, config_file)?;
            Ok(service.list_models_ids()?.join("\n"))
        }
        Commands::Predict { model_id, query } => {
            let record = parse_query(&query)?;
            let service = open_service(workspace, config_file)?;
            let prediction = service.predict(&model_id, &record)?;
            Ok(serde_json::json!({ "prediction": prediction.value }).to_string())
        }
        Commands::Run {
            input_url,
            target_column,
            model_id,
        } => {
            let service = open_service(workspace, config_file)?;
            let metadata = service
                .run_experiment(&input_url, &target_column, &model_id)
                .await?;
            let summary = metrics_summary(&metadata)?;
            let lines: Vec<String> = METRIC_LABELS
                .iter()
                .map(|(_, label)| {
                    let score = summary.get(*label).and_then(Value::as_str).unwrap_or_default();
                    format!("{label}: {score}")
                })
                .collect();
            Ok(lines.join("\n"))
        }
        Commands::Report { metric } => {
            let service = open_service(workspace, config_file)?;
            let report = service.report_benchmark(&metric)?;
            tracing::info!(path = %report.path.display(), "Report written");
            match report.best() {
                Some(best) => Ok(serde_json::to_string_pretty(best)?),
                None => Ok(NO_MODELS_MESSAGE.to_string()),
            }
        }
        Commands::Serve { host, port } => {
            let config = load(workspace, config_file)?;
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let service = Arc::new(ModelService::from_config(&config)?);
            gateway::run(service, &host, port).await?;
            Ok(String::new())
        }
    }
}

fn open_service(workspace: &Path, config_file: Option<&Path>) -> anyhow::Result<ModelService> {
    let config = load(workspace, config_file)?;
    Ok(ModelService::from_config(&config)?)
}

fn load(workspace: &Path, config_file: Option<&Path>) -> anyhow::Result<ModelbenchConfig> {
    load_config(Some(workspace), config_file)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
}

fn parse_query(query: &str) -> anyhow::Result<Record> {
    let value: Value = serde_json::from_str(query).context("--query is not valid JSON")?;
    match value {
        Value::Object(record) => Ok(record),
        other => anyhow::bail!("--query must be a JSON object, got {other}"),
    }
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<String> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace.join(WORKSPACE_CONFIG_FILE);
            if config_path.exists() {
                return Ok(format!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                ));
            }
            let toml_str = toml::to_string_pretty(&ModelbenchConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            Ok(format!(
                "Created default configuration at: {}",
                config_path.display()
            ))
        }
        ConfigAction::Show => {
            let config = load(workspace, config_file)?;
            Ok(toml::to_string_pretty(&config)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use std::future::Future;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Run `test` inside a jail whose directory is a workspace with both
    /// roots configured. The user's config file and environment stay out;
    /// only `env` is set.
    fn in_workspace<F, Fut>(env: &[(&str, &str)], test: F)
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = ()>,
    {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let ws = jail.directory().to_path_buf();
            jail.set_env("HOME", ws.display());
            jail.set_env("XDG_CONFIG_HOME", ws.join(".config").display());
            for (key, value) in env {
                jail.set_env(key, value);
            }
            jail.create_file(
                WORKSPACE_CONFIG_FILE,
                &format!(
                    "models_root = \"{}\"\nreports_root = \"{}\"\n\n[experiment]\nsplit_seed = 7\n",
                    ws.join("models").display(),
                    ws.join("reports").display(),
                ),
            )?;
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap()
                .block_on(test(ws));
            Ok(())
        });
    }

    fn write_dataset(ws: &Path) -> String {
        let mut csv = String::from("hours,plan,churned\n");
        for i in 0..40 {
            let plan = if i % 2 == 0 { "basic" } else { "pro" };
            let churned = if i < 20 { "yes" } else { "no" };
            csv.push_str(&format!("{i},{plan},{churned}\n"));
        }
        let path = ws.join("churn.csv");
        std::fs::write(&path, csv).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_config_init_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path();

        let first = handle_config(ConfigAction::Init, workspace, None).unwrap();
        assert!(first.starts_with("Created default configuration"));
        let config_path = workspace.join(WORKSPACE_CONFIG_FILE);
        let content_first = std::fs::read_to_string(&config_path).unwrap();
        assert!(content_first.contains("max_depth = 8"));

        let second = handle_config(ConfigAction::Init, workspace, None).unwrap();
        assert!(second.starts_with("Configuration file already exists"));
        assert_eq!(content_first, std::fs::read_to_string(&config_path).unwrap());
    }

    #[test]
    fn test_config_show_reads_workspace_file() {
        in_workspace(&[], |ws| async move {
            let shown = execute(
                Commands::Config {
                    action: ConfigAction::Show,
                },
                &ws,
                None,
            )
            .await
            .unwrap();
            assert!(shown.contains("split_seed = 7"));
            assert!(shown.contains("max_depth = 8"));
        });
    }

    #[test]
    fn test_environment_overrides_workspace_file() {
        in_workspace(&[("MODELBENCH_EXPERIMENT__SPLIT_SEED", "11")], |ws| async move {
            let shown = execute(
                Commands::Config {
                    action: ConfigAction::Show,
                },
                &ws,
                None,
            )
            .await
            .unwrap();
            assert!(shown.contains("split_seed = 11"));
        });
    }

    #[test]
    fn test_run_predict_report() {
        in_workspace(&[], |ws| async move {
            let data = write_dataset(&ws);

            assert_eq!(execute(Commands::Models, &ws, None).await.unwrap(), "");
            assert_eq!(
                execute(
                    Commands::Report {
                        metric: "accuracy".into()
                    },
                    &ws,
                    None
                )
                .await
                .unwrap(),
                NO_MODELS_MESSAGE
            );

            let run = execute(
                Commands::Run {
                    input_url: data,
                    target_column: "churned".into(),
                    model_id: "churn-v1".into(),
                },
                &ws,
                None,
            )
            .await
            .unwrap();
            let labels: Vec<&str> = run
                .lines()
                .filter_map(|l| l.split(": ").next())
                .collect();
            assert_eq!(labels.len(), 4);
            assert!(run.contains("Accuracy: "));
            assert!(run.contains("F1 Score: "));

            assert_eq!(execute(Commands::Models, &ws, None).await.unwrap(), "churn-v1");

            let predicted = execute(
                Commands::Predict {
                    model_id: "churn-v1".into(),
                    query: r#"{"hours": 35, "plan": "pro"}"#.into(),
                },
                &ws,
                None,
            )
            .await
            .unwrap();
            assert_eq!(predicted, r#"{"prediction":"no"}"#);

            let report = execute(
                Commands::Report {
                    metric: "accuracy".into(),
                },
                &ws,
                None,
            )
            .await
            .unwrap();
            assert!(report.contains("\"model_id\": \"churn-v1\""));
            assert!(ws.join("reports").join("benchmark_accuracy.csv").exists());
        });
    }

    #[test]
    fn test_predict_rejects_non_object_query() {
        in_workspace(&[], |ws| async move {
            let err = execute(
                Commands::Predict {
                    model_id: "m".into(),
                    query: "[1, 2]".into(),
                },
                &ws,
                None,
            )
            .await
            .unwrap_err();
            assert!(err.to_string().contains("JSON object"));
        });
    }

    #[test]
    fn test_parse_query() {
        let record = parse_query(r#"{"a": 1, "b": null}"#).unwrap();
        assert_eq!(record.len(), 2);
        assert!(parse_query("{oops").is_err());
    }
}
