//! Dataset ingestion from a URL or local path.

use crate::data::dataset::Dataset;
use crate::error::{ModelbenchError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Loads a tabular dataset from a location string.
#[async_trait]
pub trait DatasetLoader: Send + Sync {
    async fn load(&self, location: &str) -> Result<Dataset>;
}

/// Where a location string points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Http(String),
    File(PathBuf),
}

impl SourceLocation {
    pub fn parse(location: &str) -> Result<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(ModelbenchError::data_source("empty dataset location"));
        }
        if location.starts_with("http://") || location.starts_with("https://") {
            return Ok(Self::Http(location.to_string()));
        }
        if let Some(path) = location.strip_prefix("file://") {
            return Ok(Self::File(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = location.split_once("://") {
            return Err(ModelbenchError::data_source(format!(
                "unsupported URL scheme '{scheme}'"
            )));
        }
        Ok(Self::File(PathBuf::from(location)))
    }
}

/// CSV loader for `http(s)://`, `file://` and plain filesystem paths.
#[derive(Debug, Clone, Default)]
pub struct CsvUrlLoader {
    client: reqwest::Client,
}

impl CsvUrlLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ModelbenchError::data_source(format!("failed to fetch {url}: {e}")))?;
        if !response.status().is_success() {
            return Err(ModelbenchError::data_source(format!(
                "fetching {url} failed with status {}",
                response.status()
            )));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| ModelbenchError::data_source(format!("failed to read {url}: {e}")))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl DatasetLoader for CsvUrlLoader {
    async fn load(&self, location: &str) -> Result<Dataset> {
        let bytes = match SourceLocation::parse(location)? {
            SourceLocation::Http(url) => self.fetch(&url).await?,
            SourceLocation::File(path) => tokio::fs::read(&path).await.map_err(|e| {
                ModelbenchError::data_source(format!("failed to read {}: {e}", path.display()))
            })?,
        };
        let dataset = Dataset::from_csv_reader(bytes.as_slice())?;
        tracing::debug!(
            location,
            rows = dataset.len(),
            columns = dataset.columns.len(),
            "Loaded dataset"
        );
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_locations() {
        assert_eq!(
            SourceLocation::parse("https://example.com/data.csv").unwrap(),
            SourceLocation::Http("https://example.com/data.csv".into())
        );
        assert_eq!(
            SourceLocation::parse("file:///tmp/data.csv").unwrap(),
            SourceLocation::File(PathBuf::from("/tmp/data.csv"))
        );
        assert_eq!(
            SourceLocation::parse("data/train.csv").unwrap(),
            SourceLocation::File(PathBuf::from("data/train.csv"))
        );
        assert!(SourceLocation::parse("ftp://host/data.csv").is_err());
        assert!(SourceLocation::parse("  ").is_err());
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "x,label").unwrap();
        writeln!(file, "1,a").unwrap();
        writeln!(file, "2,b").unwrap();
        file.flush().unwrap();

        let url = format!("file://{}", file.path().display());
        let ds = CsvUrlLoader::new().load(&url).await.unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.columns, vec!["x", "label"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_data_source_error() {
        let err = CsvUrlLoader::new()
            .load("/nonexistent/modelbench/data.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, ModelbenchError::DataSource(_)));
    }
}
