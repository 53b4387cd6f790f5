// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for lifecycle tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use th_adapters::{
    FakeLogAnalyzer, FakeSourceFetcher, FakeValidator, MemoryDatasetRegistry, SpoolQueue,
    StatusRecord,
};
use th_core::WorkerIdentity;
use th_engine::{PipelineDeps, StepPipeline, WorkerConfig, WorkerLoop};

use super::Daemon;
use crate::config::Config;

/// A valid config rooted entirely under `root`.
pub(super) fn config_in(root: &Path) -> Config {
    let text = format!(
        r#"
job_working_dir = "{root}/jobs"
git_working_dir = "{root}/git"
pip_download_cache = "{root}/pip"
datasets_dir = "{root}/datasets"

[queue]
spool_dir = "{root}/spool"
poll_interval_ms = 10
claim_retry_ms = 10

[git]
url = "{root}/remotes/"
timeout_secs = 5

[validator]
command = "{root}/validate.sh"
"#,
        root = root.display()
    );
    Config::parse(&text, &root.join("config.toml")).unwrap()
}

/// Drop a job into the spool's incoming directory.
pub(super) fn submit(spool: &Path, job_id: &str, payload: &str) {
    std::fs::write(spool.join("incoming").join(format!("{job_id}.json")), payload).unwrap();
}

/// Every record written for `job_id`.
pub(super) fn records(spool: &Path, job_id: &str) -> Vec<StatusRecord> {
    let text = std::fs::read_to_string(spool.join("status").join(format!("{job_id}.jsonl")))
        .unwrap_or_default();
    text.lines().map(|line| serde_json::from_str(line).unwrap()).collect()
}

/// A one-job daemon on a real spool at `root/spool`, with fake steps.
pub(super) fn spool_daemon(root: &Path, fetcher: FakeSourceFetcher) -> Daemon {
    let poll = Duration::from_millis(10);
    let queue = Arc::new(SpoolQueue::open(root.join("spool"), poll).unwrap());
    let deps = PipelineDeps {
        fetcher: Arc::new(fetcher),
        validator: Arc::new(FakeValidator::new()),
        analyzer: Arc::new(FakeLogAnalyzer::new()),
        registry: Arc::new(MemoryDatasetRegistry::new(Vec::new())),
    };
    let identity = WorkerIdentity::for_host("gate-01");
    let (worker, handle) = WorkerLoop::new(
        Arc::clone(&queue),
        StepPipeline::new(deps, root.join("jobs")),
        identity.payload().unwrap(),
        WorkerConfig { claim_retry_delay: poll, max_jobs: Some(1) },
    );
    Daemon { identity, worker, handle, queue, cancel_poll: poll }
}
