// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source fetching: materialize a repository reference on local disk.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::subprocess::{run_with_timeout, SubprocessError, GIT_TIMEOUT};

/// Errors from fetching a source reference.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid repository name '{0}'")]
    InvalidRepo(String),

    #[error("invalid reference '{0}'")]
    InvalidRef(String),

    #[error("{command} failed: {stderr}")]
    Git { command: &'static str, stderr: String },

    #[error(transparent)]
    Subprocess(#[from] SubprocessError),

    #[error("failed to prepare checkout at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Adapter that resolves a repository reference into a local checkout.
#[async_trait]
pub trait SourceFetcher: Send + Sync + 'static {
    /// Fetch `reference` of `repo` and check it out; returns the checkout path.
    async fn fetch(&self, repo: &str, reference: &str) -> Result<PathBuf, FetchError>;
}

/// Fetches with the `git` CLI into `<checkout_root>/<repo>`.
///
/// The checkout is reused across jobs: each fetch updates it in place and
/// checks out `FETCH_HEAD`.
pub struct GitFetcher {
    base_url: String,
    checkout_root: PathBuf,
    timeout: Duration,
}

impl GitFetcher {
    /// `base_url` is joined with the repository name verbatim
    /// (e.g. `https://review.example.org/` + `openstack/nova`).
    pub fn new(base_url: impl Into<String>, checkout_root: impl Into<PathBuf>) -> Self {
        Self { base_url: base_url.into(), checkout_root: checkout_root.into(), timeout: GIT_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Local checkout path for `repo`.
    pub fn checkout_path(&self, repo: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(repo);
        let valid = !repo.is_empty()
            && relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(FetchError::InvalidRepo(repo.to_string()));
        }
        Ok(self.checkout_root.join(relative))
    }

    /// Reject references git would parse as an option.
    pub fn check_reference(reference: &str) -> Result<(), FetchError> {
        if reference.is_empty() || reference.starts_with('-') {
            return Err(FetchError::InvalidRef(reference.to_string()));
        }
        Ok(())
    }

    async fn git(&self, dir: &Path, args: &[&str], command: &'static str) -> Result<(), FetchError> {
        let mut cmd = Command::new("git");
        cmd.arg("-C")
            .arg(dir)
            .args(args)
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE");
        let output = run_with_timeout(cmd, self.timeout, command).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(FetchError::Git { command, stderr });
        }
        Ok(())
    }
}

#[async_trait]
impl SourceFetcher for GitFetcher {
    async fn fetch(&self, repo: &str, reference: &str) -> Result<PathBuf, FetchError> {
        let path = self.checkout_path(repo)?;
        Self::check_reference(reference)?;
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| FetchError::Io { path: path.clone(), source })?;

        if !path.join(".git").exists() {
            self.git(&path, &["init", "--quiet"], "git init").await?;
        }

        let url = format!("{}{}", self.base_url, repo);
        tracing::info!(%url, reference, path = %path.display(), "fetching source");
        self.git(&path, &["fetch", "--quiet", "--end-of-options", &url, reference], "git fetch")
            .await?;
        self.git(&path, &["checkout", "--quiet", "--force", "FETCH_HEAD"], "git checkout")
            .await?;

        Ok(path)
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{FetchError, SourceFetcher};
    use crate::call_log::{CallLog, Hook};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use std::sync::Arc;

    /// Recorded fetch
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FetchCall {
        pub repo: String,
        pub reference: String,
    }

    #[derive(Default)]
    struct FakeFetcherState {
        calls: Vec<FetchCall>,
        fail_with: Option<String>,
        hook: Option<Hook>,
        log: Option<CallLog>,
    }

    /// Fake source fetcher returning `/src/<repo>` without touching disk
    #[derive(Clone, Default)]
    pub struct FakeSourceFetcher {
        inner: Arc<Mutex<FakeFetcherState>>,
    }

    impl FakeSourceFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail every fetch as git would, with `stderr` as the message.
        pub fn fail_with(self, stderr: impl Into<String>) -> Self {
            self.inner.lock().fail_with = Some(stderr.into());
            self
        }

        /// Run `hook` during each fetch.
        pub fn with_hook(self, hook: Hook) -> Self {
            self.inner.lock().hook = Some(hook);
            self
        }

        pub fn with_log(self, log: CallLog) -> Self {
            self.inner.lock().log = Some(log);
            self
        }

        pub fn calls(&self) -> Vec<FetchCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl SourceFetcher for FakeSourceFetcher {
        async fn fetch(&self, repo: &str, reference: &str) -> Result<PathBuf, FetchError> {
            let (hook, fail_with) = {
                let mut inner = self.inner.lock();
                inner
                    .calls
                    .push(FetchCall { repo: repo.to_string(), reference: reference.to_string() });
                if let Some(log) = &inner.log {
                    log.record(format!("fetch:{repo}"));
                }
                (inner.hook.clone(), inner.fail_with.clone())
            };
            if let Some(hook) = hook {
                hook();
            }
            match fail_with {
                Some(stderr) => Err(FetchError::Git { command: "git fetch", stderr }),
                None => Ok(PathBuf::from("/src").join(repo)),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSourceFetcher, FetchCall};

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
