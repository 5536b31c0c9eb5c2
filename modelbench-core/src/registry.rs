//! Model registry: durable storage of (artifact, metadata) pairs keyed by model id.
//!
//! Layout under the registry root:
//!
//! ```text
//! <root>/<id>/metadata.json         commit record: metadata + name of the artifact file
//! <root>/<id>/artifact-<uuid>.json  versioned artifact envelope
//! ```
//!
//! A save writes the artifact to a fresh file first, then atomically replaces
//! `metadata.json`. Until that rename lands, readers keep seeing the previous
//! entry (or no entry), and a directory without `metadata.json` is never listed.
//!
//! Concurrent saves to the same id are last-writer-wins: there is no locking
//! and no optimistic versioning. Callers that add concurrent request handling
//! must serialize writers per id themselves if they need more.

use crate::config::ModelbenchConfig;
use crate::error::{ModelbenchError, Result};
use crate::metadata::ClassifierMetadata;
use crate::model::ModelArtifact;
use crate::persistence;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

const COMMIT_FILE: &str = "metadata.json";
const ARTIFACT_PREFIX: &str = "artifact-";

/// What `metadata.json` holds on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CommitRecord {
    artifact_file: String,
    metadata: ClassifierMetadata,
}

/// Check that `id` can key a registry entry: non-empty, a single path
/// component, no leading dot.
pub fn validate_model_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(ModelbenchError::invalid_model_id("model id must not be empty"));
    }
    if id.starts_with('.') {
        return Err(ModelbenchError::invalid_model_id(format!(
            "'{id}' must not start with '.'"
        )));
    }
    if id.chars().any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control()) {
        return Err(ModelbenchError::invalid_model_id(format!(
            "'{id}' contains a path separator or control character"
        )));
    }
    Ok(())
}

/// Filesystem-backed model registry.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    root: PathBuf,
}

impl ModelRegistry {
    /// Open a registry rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(ModelbenchError::configuration("models root is empty"));
        }
        if root.exists() && !root.is_dir() {
            return Err(ModelbenchError::configuration(format!(
                "models root {} exists but is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn from_config(config: &ModelbenchConfig) -> Result<Self> {
        Self::new(config.models_root()?)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist `artifact` and `metadata` under `metadata.id`, replacing any previous entry.
    pub fn save(&self, artifact: &ModelArtifact, metadata: &ClassifierMetadata) -> Result<()> {
        let id = metadata.id.as_str();
        validate_model_id(id)?;

        let previous = self.read_commit(id)?.map(|c| c.artifact_file);
        let artifact_file = self.stage_artifact(id, artifact)?;
        self.commit(id, &artifact_file, metadata)?;

        if let Some(old) = previous.filter(|old| *old != artifact_file) {
            let old_path = self.entry_dir(id).join(&old);
            if let Err(e) = std::fs::remove_file(&old_path) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(
                        model_id = id,
                        path = %old_path.display(),
                        error = %e,
                        "Failed to remove replaced artifact"
                    );
                }
            }
        }

        tracing::info!(
            model_id = id,
            path = %self.entry_dir(id).display(),
            "Saved model"
        );
        Ok(())
    }

    /// Load the artifact registered under `id`.
    pub fn load_model(&self, id: &str) -> Result<ModelArtifact> {
        validate_model_id(id)?;
        // A concurrent save may remove the artifact named by the record we just
        // read; the fresh record then names the replacement.
        let mut last_missing = None;
        for _ in 0..2 {
            let commit = self.require_commit(id)?;
            let path = self.entry_dir(id).join(&commit.artifact_file);
            match std::fs::read(&path) {
                Ok(bytes) => return ModelArtifact::from_bytes(&bytes),
                Err(e) if e.kind() == io::ErrorKind::NotFound => last_missing = Some(path),
                Err(e) => return Err(e.into()),
            }
        }
        Err(ModelbenchError::storage(format!(
            "model '{id}' references missing artifact {}",
            last_missing.map(|p| p.display().to_string()).unwrap_or_default()
        )))
    }

    /// Load only the metadata of `id`; the artifact file is not read.
    pub fn load_model_metadata(&self, id: &str) -> Result<ClassifierMetadata> {
        validate_model_id(id)?;
        Ok(self.require_commit(id)?.metadata)
    }

    /// Every committed model id, in lexicographic order.
    pub fn list_models_ids(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if validate_model_id(&name).is_err() {
                continue;
            }
            if entry.path().join(COMMIT_FILE).is_file() {
                ids.push(name);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Write the artifact for `id` to a new file and return its name. The
    /// entry does not change until [`Self::commit`] runs.
    pub(crate) fn stage_artifact(&self, id: &str, artifact: &ModelArtifact) -> Result<String> {
        let file = format!("{ARTIFACT_PREFIX}{}.json", uuid::Uuid::new_v4().simple());
        let path = self.entry_dir(id).join(&file);
        persistence::atomic_write(&path, &artifact.to_bytes()?)?;
        Ok(file)
    }

    fn commit(&self, id: &str, artifact_file: &str, metadata: &ClassifierMetadata) -> Result<()> {
        let record = CommitRecord {
            artifact_file: artifact_file.to_string(),
            metadata: metadata.clone(),
        };
        persistence::atomic_write_json(&self.entry_dir(id).join(COMMIT_FILE), &record)?;
        Ok(())
    }

    fn read_commit(&self, id: &str) -> Result<Option<CommitRecord>> {
        persistence::load_json(&self.entry_dir(id).join(COMMIT_FILE)).map_err(|e| {
            if e.kind() == io::ErrorKind::InvalidData {
                ModelbenchError::storage(format!("corrupt metadata for model '{id}': {e}"))
            } else {
                e.into()
            }
        })
    }

    fn require_commit(&self, id: &str) -> Result<CommitRecord> {
        self.read_commit(id)?
            .ok_or_else(|| ModelbenchError::not_found(format!("model '{id}' is not registered")))
    }

    fn entry_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }
}
