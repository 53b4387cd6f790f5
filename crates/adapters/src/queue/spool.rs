// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed job queue.
//!
//! Layout under the spool root:
//!
//! ```text
//! incoming/<job_id>.json   submitted jobs, claimed in name order
//! claimed/<job_id>.json    jobs taken by a worker (atomic rename)
//! status/<job_id>.jsonl    one StatusRecord per signal
//! cancel/<job_id>          cancel requests, consumed by the daemon
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use th_core::JobId;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use super::{ClaimedJob, JobQueue, QueueError, StatusSink};

const INCOMING: &str = "incoming";
const CLAIMED: &str = "claimed";
const STATUS: &str = "status";
const CANCEL: &str = "cancel";

/// One signal as written to a status file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusSignal {
    Data { body: serde_json::Value },
    Status { current: u32, total: u32 },
    Complete { body: serde_json::Value },
    Fail,
    Exception { message: String },
}

/// A timestamped line of `status/<job_id>.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub signal: StatusSignal,
}

/// Job queue backed by a spool directory, shared by any number of workers.
pub struct SpoolQueue {
    root: PathBuf,
    poll_interval: Duration,
    closed: CancellationToken,
}

impl SpoolQueue {
    /// Open (and create if needed) the spool at `root`.
    pub fn open(root: impl Into<PathBuf>, poll_interval: Duration) -> Result<Self, QueueError> {
        let root = root.into();
        for dir in [INCOMING, CLAIMED, STATUS, CANCEL] {
            std::fs::create_dir_all(root.join(dir))?;
        }
        Ok(Self { root, poll_interval, closed: CancellationToken::new() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the status file for `job_id`.
    pub fn status_path(&self, job_id: &str) -> PathBuf {
        self.root.join(STATUS).join(format!("{job_id}.jsonl"))
    }

    /// Drain pending cancel requests, returning the job IDs they name.
    pub async fn take_cancel_requests(&self) -> Result<Vec<JobId>, QueueError> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(self.root.join(CANCEL)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!(path = %entry.path().display(), "ignoring non-utf8 cancel request");
                continue;
            };
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => ids.push(JobId::new(name)),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(ids)
    }

    /// Claim the first pending job, if any.
    async fn try_claim(&self) -> Result<Option<ClaimedJob<SpoolSink>>, QueueError> {
        let incoming = self.root.join(INCOMING);
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&incoming).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            names.push(entry.file_name());
        }
        names.sort();

        for name in names {
            if self.closed.is_cancelled() {
                return Err(QueueError::Shutdown);
            }
            let from = incoming.join(&name);
            let to = self.root.join(CLAIMED).join(&name);
            match tokio::fs::rename(&from, &to).await {
                Ok(()) => {}
                // Another worker won the race for this file
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }

            let Some(stem) = to.file_stem().and_then(|s| s.to_str()) else {
                return Err(QueueError::Malformed(format!(
                    "job file name is not utf-8: {}",
                    to.display()
                )));
            };
            let id = JobId::new(stem);
            let payload = tokio::fs::read(&to).await?;
            let sink = SpoolSink::new(self.status_path(&id));
            tracing::debug!(job_id = %id, path = %to.display(), "claimed spool job");
            return Ok(Some(ClaimedJob { id, payload, sink }));
        }
        Ok(None)
    }
}

#[async_trait]
impl JobQueue for SpoolQueue {
    type Sink = SpoolSink;

    async fn claim(&self) -> Result<ClaimedJob<SpoolSink>, QueueError> {
        loop {
            if self.closed.is_cancelled() {
                return Err(QueueError::Shutdown);
            }
            if let Some(job) = self.try_claim().await? {
                return Ok(job);
            }
            tokio::select! {
                _ = self.closed.cancelled() => return Err(QueueError::Shutdown),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    async fn shutdown(&self) {
        tracing::debug!(root = %self.root.display(), "closing spool queue");
        self.closed.cancel();
    }
}

/// Appends status records for one job to its status file.
pub struct SpoolSink {
    path: PathBuf,
}

impl SpoolSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, signal: StatusSignal) -> Result<(), QueueError> {
        let record = StatusRecord { at: Utc::now(), signal };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Bodies are JSON in practice; anything else is kept as a string.
fn body(payload: &[u8]) -> serde_json::Value {
    serde_json::from_slice(payload)
        .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(payload).into_owned()))
}

#[async_trait]
impl StatusSink for SpoolSink {
    async fn send_data(&self, payload: &[u8]) -> Result<(), QueueError> {
        self.append(StatusSignal::Data { body: body(payload) }).await
    }

    async fn send_status(&self, current: u32, total: u32) -> Result<(), QueueError> {
        self.append(StatusSignal::Status { current, total }).await
    }

    async fn send_complete(&self, payload: &[u8]) -> Result<(), QueueError> {
        self.append(StatusSignal::Complete { body: body(payload) }).await
    }

    async fn send_fail(&self) -> Result<(), QueueError> {
        self.append(StatusSignal::Fail).await
    }

    async fn send_exception(&self, message: &str) -> Result<(), QueueError> {
        self.append(StatusSignal::Exception { message: message.to_string() }).await
    }
}

#[cfg(test)]
#[path = "spool_tests.rs"]
mod tests;
