// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use th_adapters::DEFAULT_ERROR_MARKERS;
use th_core::WorkerIdentity;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required config key '{0}'")]
    Missing(&'static str),

    #[error("invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Identity overrides; unset fields fall back to host-derived defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerSection {
    pub name: Option<String>,
    pub number: Option<u32>,
    pub manager: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueSection {
    #[serde(default)]
    pub spool_dir: PathBuf,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_claim_retry_ms")]
    pub claim_retry_ms: u64,
}

impl Default for QueueSection {
    fn default() -> Self {
        Self {
            spool_dir: PathBuf::new(),
            poll_interval_ms: default_poll_interval_ms(),
            claim_retry_ms: default_claim_retry_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitSection {
    pub url: String,
    #[serde(default = "default_git_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorSection {
    pub command: PathBuf,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub error_markers: Option<Vec<String>>,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_claim_retry_ms() -> u64 {
    5000
}

fn default_git_timeout_secs() -> u64 {
    600
}

/// Daemon configuration, loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Per-job artifacts live under `<job_working_dir>/<job_id>/`
    pub job_working_dir: PathBuf,
    /// Checkouts live under `<git_working_dir>/<worker_name>/<repo>`
    pub git_working_dir: PathBuf,
    pub pip_download_cache: PathBuf,
    pub datasets_dir: PathBuf,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Stop after this many jobs; unset loops forever
    #[serde(default)]
    pub max_jobs: Option<u32>,
    #[serde(default)]
    pub worker: WorkerSection,
    #[serde(default)]
    pub queue: QueueSection,
    pub git: GitSection,
    pub validator: ValidatorSection,
}

impl Config {
    /// Read `path`, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let mut config = Self::parse(&text, path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse without environment overrides or validation.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    fn apply_env(&mut self) {
        if let Some(dir) = crate::env::log_dir() {
            self.log_dir = Some(dir);
        }
        if let Some(dir) = crate::env::spool_dir() {
            self.queue.spool_dir = dir;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.spool_dir.as_os_str().is_empty() {
            return Err(ConfigError::Missing("queue.spool_dir"));
        }
        if self.git.url.trim().is_empty() {
            return Err(ConfigError::Missing("git.url"));
        }
        if self.validator.command.as_os_str().is_empty() {
            return Err(ConfigError::Missing("validator.command"));
        }
        if self.queue.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "queue.poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.git.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "git.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_jobs == Some(0) {
            return Err(ConfigError::Invalid {
                key: "max_jobs",
                reason: "must be at least 1, or omitted to run forever".to_string(),
            });
        }
        if matches!(&self.validator.error_markers, Some(markers) if markers.iter().any(String::is_empty))
        {
            return Err(ConfigError::Invalid {
                key: "validator.error_markers",
                reason: "markers must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Worker identity for `host`, with configured fields taking precedence.
    pub fn identity(&self, host: &str) -> WorkerIdentity {
        let defaults = WorkerIdentity::for_host(host);
        WorkerIdentity {
            name: self.worker.name.clone().unwrap_or(defaults.name),
            number: self.worker.number.unwrap_or(defaults.number),
            manager: self.worker.manager.clone().unwrap_or(defaults.manager),
            url: self.worker.url.clone().unwrap_or(defaults.url),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.queue.poll_interval_ms)
    }

    pub fn claim_retry_delay(&self) -> Duration {
        Duration::from_millis(self.queue.claim_retry_ms)
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git.timeout_secs)
    }

    pub fn validator_timeout(&self) -> Option<Duration> {
        self.validator.timeout_secs.map(Duration::from_secs)
    }

    pub fn error_markers(&self) -> Vec<String> {
        match &self.validator.error_markers {
            Some(markers) => markers.clone(),
            None => DEFAULT_ERROR_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
