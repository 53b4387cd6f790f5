// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log analysis: decide whether a validation artifact shows errors.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::validator::LogArtifact;

/// Markers scanned for when none are configured.
pub const DEFAULT_ERROR_MARKERS: &[&str] =
    &["ERROR", "CRITICAL", "Traceback (most recent call last)"];

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("failed to read log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Adapter that scans a log artifact for errors.
#[async_trait]
pub trait LogAnalyzer: Send + Sync + 'static {
    /// Returns `true` when the artifact shows errors.
    async fn scan(&self, artifact: &LogArtifact) -> Result<bool, AnalyzeError>;
}

/// Flags an artifact whose validator exited unsuccessfully, or whose log
/// contains any configured marker.
pub struct MarkerLogAnalyzer {
    markers: Vec<String>,
}

impl MarkerLogAnalyzer {
    pub fn new(markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { markers: markers.into_iter().map(Into::into).collect() }
    }
}

impl Default for MarkerLogAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_MARKERS.iter().copied())
    }
}

#[async_trait]
impl LogAnalyzer for MarkerLogAnalyzer {
    async fn scan(&self, artifact: &LogArtifact) -> Result<bool, AnalyzeError> {
        if !artifact.exit.success() {
            tracing::info!(preset = %artifact.preset, exit = %artifact.exit, "validator did not succeed");
            return Ok(true);
        }

        let bytes = tokio::fs::read(&artifact.path)
            .await
            .map_err(|source| AnalyzeError::Read { path: artifact.path.clone(), source })?;
        let text = String::from_utf8_lossy(&bytes);

        for (number, line) in text.lines().enumerate() {
            if let Some(marker) = self.markers.iter().find(|m| line.contains(m.as_str())) {
                tracing::info!(
                    preset = %artifact.preset,
                    line = number + 1,
                    %marker,
                    "error marker found in log"
                );
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{AnalyzeError, LogAnalyzer};
    use crate::call_log::CallLog;
    use crate::validator::LogArtifact;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeAnalyzerState {
        scanned: Vec<String>,
        failing: HashSet<String>,
        log: Option<CallLog>,
    }

    /// Fake analyzer reporting errors only for configured presets
    #[derive(Clone, Default)]
    pub struct FakeLogAnalyzer {
        inner: Arc<Mutex<FakeAnalyzerState>>,
    }

    impl FakeLogAnalyzer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_errors_in(self, preset: &str) -> Self {
            self.inner.lock().failing.insert(preset.to_string());
            self
        }

        pub fn with_log(self, log: CallLog) -> Self {
            self.inner.lock().log = Some(log);
            self
        }

        /// Presets scanned so far, in order
        pub fn scanned(&self) -> Vec<String> {
            self.inner.lock().scanned.clone()
        }
    }

    #[async_trait]
    impl LogAnalyzer for FakeLogAnalyzer {
        async fn scan(&self, artifact: &LogArtifact) -> Result<bool, AnalyzeError> {
            let mut inner = self.inner.lock();
            inner.scanned.push(artifact.preset.clone());
            if let Some(log) = &inner.log {
                log.record(format!("analyze:{}", artifact.preset));
            }
            Ok(inner.failing.contains(&artifact.preset))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeLogAnalyzer;

#[cfg(test)]
#[path = "analyzer_tests.rs"]
mod tests;
