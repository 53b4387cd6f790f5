// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forwards spool cancel requests to the worker.

use std::sync::Arc;
use std::time::Duration;

use th_adapters::SpoolQueue;
use th_engine::WorkerHandle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Poll `queue` for cancel requests every `interval` until `done` fires.
///
/// Requests naming a job other than the active one are consumed and dropped.
pub fn spawn_cancel_watcher(
    queue: Arc<SpoolQueue>,
    handle: WorkerHandle,
    interval: Duration,
    done: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = done.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            match queue.take_cancel_requests().await {
                Ok(ids) => {
                    for id in ids {
                        if !handle.request_cancel(&id) {
                            tracing::info!(job_id = %id, "dropping cancel request for inactive job");
                        }
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to read cancel requests"),
            }
        }
    })
}
