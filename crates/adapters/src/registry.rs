// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dataset preset discovery.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use th_core::{DatasetPreset, PresetConfig, PRESET_CONFIG_FILE};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read datasets at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed preset config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of the presets the validation step runs against.
#[async_trait]
pub trait DatasetRegistry: Send + Sync + 'static {
    async fn list_presets(&self) -> Result<Vec<DatasetPreset>, RegistryError>;
}

/// Presets discovered from a directory: every subdirectory holding a
/// `config.json`, sorted by name.
///
/// The first successful scan is cached for the life of the process.
pub struct DirDatasetRegistry {
    root: PathBuf,
    cache: Mutex<Option<Vec<DatasetPreset>>>,
}

impl DirDatasetRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache: Mutex::new(None) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn scan(&self) -> Result<Vec<DatasetPreset>, RegistryError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| RegistryError::Io { path, source }
        };

        let mut presets = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(io_err(&self.root))?;
        while let Some(entry) = entries.next_entry().await.map_err(io_err(&self.root))? {
            let dir = entry.path();
            let config_path = dir.join(PRESET_CONFIG_FILE);
            if !dir.is_dir() || !config_path.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!(path = %dir.display(), "skipping non-utf8 preset directory");
                continue;
            };

            let raw = tokio::fs::read(&config_path).await.map_err(io_err(&config_path))?;
            let config: PresetConfig = serde_json::from_slice(&raw)
                .map_err(|source| RegistryError::Config { path: config_path.clone(), source })?;
            presets.push(DatasetPreset { name, path: dir, config });
        }
        presets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(presets)
    }
}

#[async_trait]
impl DatasetRegistry for DirDatasetRegistry {
    async fn list_presets(&self) -> Result<Vec<DatasetPreset>, RegistryError> {
        let cached = self.cache.lock().clone();
        if let Some(presets) = cached {
            return Ok(presets);
        }

        let presets = self.scan().await?;
        tracing::info!(
            root = %self.root.display(),
            count = presets.len(),
            "discovered dataset presets"
        );
        *self.cache.lock() = Some(presets.clone());
        Ok(presets)
    }
}

/// Fixed, in-memory preset list.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatasetRegistry {
    presets: Vec<DatasetPreset>,
}

impl MemoryDatasetRegistry {
    pub fn new(presets: Vec<DatasetPreset>) -> Self {
        Self { presets }
    }
}

#[async_trait]
impl DatasetRegistry for MemoryDatasetRegistry {
    async fn list_presets(&self) -> Result<Vec<DatasetPreset>, RegistryError> {
        Ok(self.presets.clone())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
