// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External validation: run the opaque validation command for one preset
//! and capture its output to a per-preset log artifact.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use th_core::{log_paths, DatasetPreset, JobId};
use thiserror::Error;
use tokio::process::Command;

/// Errors that prevent the validator from running at all.
///
/// A validator that runs and exits non-zero is not an error; its exit is
/// recorded in the [`LogArtifact`].
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("failed to spawn validator {command}: {source}")]
    Spawn {
        command: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write validator log {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for validator: {0}")]
    Wait(#[source] std::io::Error),
}

/// How the validator process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationExit {
    Code(i32),
    /// Terminated by a signal
    Killed,
    TimedOut,
}

impl ValidationExit {
    pub fn success(&self) -> bool {
        matches!(self, ValidationExit::Code(0))
    }
}

impl From<ExitStatus> for ValidationExit {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => ValidationExit::Code(code),
            None => ValidationExit::Killed,
        }
    }
}

impl fmt::Display for ValidationExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationExit::Code(code) => write!(f, "exit status {code}"),
            ValidationExit::Killed => f.write_str("killed by signal"),
            ValidationExit::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Captured output of one validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogArtifact {
    pub preset: String,
    pub path: PathBuf,
    pub exit: ValidationExit,
}

/// Everything the validator needs for one preset.
#[derive(Debug, Clone, Copy)]
pub struct ValidationRequest<'a> {
    pub job_id: &'a JobId,
    pub work_dir: &'a Path,
    pub source_path: &'a Path,
    pub preset: &'a DatasetPreset,
}

impl ValidationRequest<'_> {
    /// Where this run's output is captured.
    pub fn log_path(&self) -> PathBuf {
        log_paths::preset_log_path(self.work_dir, self.job_id, &self.preset.name)
    }
}

/// Adapter that runs validation for one preset.
#[async_trait]
pub trait ExternalValidator: Send + Sync + 'static {
    async fn run(&self, request: ValidationRequest<'_>) -> Result<LogArtifact, ValidatorError>;
}

/// Runs a validation script with positional arguments:
///
/// ```text
/// <command> <job_id> <work_dir> <source_path> <db_user> <db_pass> <db_name> <preset_path> <pip_cache_dir>
/// ```
///
/// stdout and stderr are appended to the preset log, followed by a
/// `[validator] <exit>` trailer.
pub struct CommandValidator {
    command: PathBuf,
    pip_cache_dir: PathBuf,
    timeout: Option<Duration>,
}

impl CommandValidator {
    pub fn new(command: impl Into<PathBuf>, pip_cache_dir: impl Into<PathBuf>) -> Self {
        Self { command: command.into(), pip_cache_dir: pip_cache_dir.into(), timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn open_log(path: &Path) -> Result<std::fs::File, ValidatorError> {
        let log_err = |source| ValidatorError::Log { path: path.to_path_buf(), source };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(log_err)?;
        }
        OpenOptions::new().create(true).append(true).open(path).map_err(log_err)
    }
}

#[async_trait]
impl ExternalValidator for CommandValidator {
    async fn run(&self, request: ValidationRequest<'_>) -> Result<LogArtifact, ValidatorError> {
        let path = request.log_path();
        let log_err = |source| ValidatorError::Log { path: path.clone(), source };

        let stdout = Self::open_log(&path)?;
        let stderr = stdout.try_clone().map_err(log_err)?;
        let config = &request.preset.config;

        let mut cmd = Command::new(&self.command);
        cmd.arg(request.job_id.as_str())
            .arg(request.work_dir)
            .arg(request.source_path)
            .arg(&config.db_user)
            .arg(&config.db_pass)
            .arg(&config.db_name)
            .arg(&request.preset.path)
            .arg(&self.pip_cache_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true);

        tracing::info!(
            job_id = %request.job_id,
            preset = %request.preset.name,
            command = %self.command.display(),
            log = %path.display(),
            "running validator"
        );
        let mut child = cmd
            .spawn()
            .map_err(|source| ValidatorError::Spawn { command: self.command.clone(), source })?;

        let exit = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait()).await {
                Ok(status) => ValidationExit::from(status.map_err(ValidatorError::Wait)?),
                Err(_) => {
                    tracing::warn!(
                        preset = %request.preset.name,
                        timeout_secs = timeout.as_secs(),
                        "validator timed out, killing"
                    );
                    if let Err(e) = child.kill().await {
                        tracing::warn!(error = %e, "failed to kill validator");
                    }
                    ValidationExit::TimedOut
                }
            },
            None => ValidationExit::from(child.wait().await.map_err(ValidatorError::Wait)?),
        };

        let mut log = Self::open_log(&path)?;
        writeln!(log, "[validator] {exit}").map_err(log_err)?;

        tracing::info!(preset = %request.preset.name, %exit, "validator finished");
        Ok(LogArtifact { preset: request.preset.name.clone(), path, exit })
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ExternalValidator, LogArtifact, ValidationExit, ValidationRequest, ValidatorError};
    use crate::call_log::{CallLog, Hook};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Arc;

    /// Recorded validation run
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ValidatorCall {
        pub job_id: String,
        pub work_dir: PathBuf,
        pub source_path: PathBuf,
        pub preset: String,
    }

    #[derive(Default)]
    struct FakeValidatorState {
        calls: Vec<ValidatorCall>,
        outputs: HashMap<String, String>,
        exits: HashMap<String, ValidationExit>,
        hook: Option<Hook>,
        log: Option<CallLog>,
    }

    /// Fake validator.
    ///
    /// Writes the configured output (if any) to the real log path so that a
    /// real analyzer can scan it; otherwise touches nothing on disk.
    #[derive(Clone, Default)]
    pub struct FakeValidator {
        inner: Arc<Mutex<FakeValidatorState>>,
    }

    impl FakeValidator {
        pub fn new() -> Self {
            Self::default()
        }

        /// Write `output` to the log artifact of `preset`.
        pub fn with_output(self, preset: &str, output: impl Into<String>) -> Self {
            self.inner.lock().outputs.insert(preset.to_string(), output.into());
            self
        }

        /// Report `exit` for `preset` (default exit status 0).
        pub fn with_exit(self, preset: &str, exit: ValidationExit) -> Self {
            self.inner.lock().exits.insert(preset.to_string(), exit);
            self
        }

        pub fn with_hook(self, hook: Hook) -> Self {
            self.inner.lock().hook = Some(hook);
            self
        }

        pub fn with_log(self, log: CallLog) -> Self {
            self.inner.lock().log = Some(log);
            self
        }

        pub fn calls(&self) -> Vec<ValidatorCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl ExternalValidator for FakeValidator {
        async fn run(
            &self,
            request: ValidationRequest<'_>,
        ) -> Result<LogArtifact, ValidatorError> {
            let preset = request.preset.name.clone();
            let path = request.log_path();
            let (output, exit, hook) = {
                let mut inner = self.inner.lock();
                inner.calls.push(ValidatorCall {
                    job_id: request.job_id.to_string(),
                    work_dir: request.work_dir.to_path_buf(),
                    source_path: request.source_path.to_path_buf(),
                    preset: preset.clone(),
                });
                if let Some(log) = &inner.log {
                    log.record(format!("validate:{preset}"));
                }
                (
                    inner.outputs.get(&preset).cloned(),
                    inner.exits.get(&preset).copied().unwrap_or(ValidationExit::Code(0)),
                    inner.hook.clone(),
                )
            };
            if let Some(hook) = hook {
                hook();
            }
            if let Some(output) = output {
                let log_err = |source| ValidatorError::Log { path: path.clone(), source };
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(log_err)?;
                }
                std::fs::write(&path, output).map_err(log_err)?;
            }
            Ok(LogArtifact { preset, path, exit })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeValidator, ValidatorCall};

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
