// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build the production collaborators from configuration.

use std::path::Path;
use std::sync::Arc;

use th_adapters::{CommandValidator, DirDatasetRegistry, GitFetcher, MarkerLogAnalyzer, SpoolQueue};
use th_engine::{PipelineDeps, StepPipeline, WorkerConfig, WorkerLoop};
use tracing::info;

use super::{Daemon, LifecycleError};
use crate::config::Config;

fn create_dir(path: &Path) -> Result<(), LifecycleError> {
    std::fs::create_dir_all(path)
        .map_err(|source| LifecycleError::Dir { path: path.to_path_buf(), source })
}

/// Wire the worker for `config` on `host`.
///
/// `max_jobs` overrides the configured job limit (the `--once` flag).
pub fn startup(config: &Config, host: &str, max_jobs: Option<u32>) -> Result<Daemon, LifecycleError> {
    config.validate()?;

    let identity = config.identity(host);
    let info_payload = identity.payload()?;

    // 1. Working directories
    let checkout_root = config.git_working_dir.join(&identity.name);
    create_dir(&config.job_working_dir)?;
    create_dir(&checkout_root)?;

    // 2. Collaborators
    let deps = PipelineDeps {
        fetcher: Arc::new(
            GitFetcher::new(config.git.url.clone(), checkout_root).with_timeout(config.git_timeout()),
        ),
        validator: Arc::new(
            CommandValidator::new(&config.validator.command, &config.pip_download_cache)
                .with_timeout(config.validator_timeout()),
        ),
        analyzer: Arc::new(MarkerLogAnalyzer::new(config.error_markers())),
        registry: Arc::new(DirDatasetRegistry::new(&config.datasets_dir)),
    };
    let pipeline = StepPipeline::new(deps, &config.job_working_dir);

    // 3. Queue and worker loop
    let queue = Arc::new(SpoolQueue::open(&config.queue.spool_dir, config.poll_interval())?);
    let worker_config = WorkerConfig {
        claim_retry_delay: config.claim_retry_delay(),
        max_jobs: max_jobs.or(config.max_jobs),
    };
    let (worker, handle) = WorkerLoop::new(Arc::clone(&queue), pipeline, info_payload, worker_config);

    info!(
        worker = %identity.name,
        number = identity.number,
        datasets = %config.datasets_dir.display(),
        max_jobs = ?max_jobs.or(config.max_jobs),
        "worker configured"
    );

    Ok(Daemon { identity, worker, handle, queue, cancel_poll: config.poll_interval() })
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
