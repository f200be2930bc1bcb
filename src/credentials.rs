use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    api_key: String,
}

/// API key persisted in a local JSON file
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at a config-style path, expanding `~` and environment variables
    pub fn from_config_path(path: &str) -> Result<Self> {
        let expanded = shellexpand::full(path)
            .with_context(|| format!("Failed to expand credentials path {}", path))?;
        Ok(Self::new(expanded.into_owned()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved API key, if any
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let stored: StoredCredentials = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed credentials file {}", self.path.display()))?;

        let key = stored.api_key.trim().to_string();
        Ok((!key.is_empty()).then_some(key))
    }

    pub fn save(&self, api_key: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create credentials directory")?;
        }

        let stored = StoredCredentials {
            api_key: api_key.trim().to_string(),
        };
        fs::write(&self.path, serde_json::to_vec_pretty(&stored)?)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        info!("Saved API key to {}", self.path.display());
        Ok(())
    }

    /// Remove the saved key. Missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }
}
