// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup wiring, running the worker, shutdown.

mod startup;
mod watcher;

pub use startup::startup;
pub use watcher::spawn_cancel_watcher;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use th_adapters::{QueueError, SpoolQueue};
use th_core::WorkerIdentity;
use th_engine::{JobReport, WorkerHandle, WorkerLoop};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ConfigError;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open spool queue: {0}")]
    Queue(#[from] QueueError),

    #[error("failed to encode worker identity: {0}")]
    Identity(#[from] serde_json::Error),

    #[error("failed to create {path}: {source}")]
    Dir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A wired-up worker, ready to run.
pub struct Daemon {
    pub identity: WorkerIdentity,
    worker: WorkerLoop<SpoolQueue>,
    handle: WorkerHandle,
    queue: Arc<SpoolQueue>,
    cancel_poll: Duration,
}

impl Daemon {
    /// Handle for stopping the worker or cancelling its job
    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    pub fn queue(&self) -> &SpoolQueue {
        &self.queue
    }

    /// Run the worker loop, forwarding spool cancel requests while it runs.
    pub async fn run(self) -> Vec<JobReport> {
        let done = CancellationToken::new();
        let watcher = spawn_cancel_watcher(
            Arc::clone(&self.queue),
            self.handle.clone(),
            self.cancel_poll,
            done.clone(),
        );

        info!(worker = %self.identity.name, spool = %self.queue.root().display(), "worker running");
        let reports = self.worker.run().await;

        done.cancel();
        if let Err(e) = watcher.await {
            warn!(error = %e, "cancel watcher ended abnormally");
        }
        reports
    }
}

/// Resolve when the process receives SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
                    _ = sigterm.recv() => info!("received SIGTERM"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    }
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received SIGINT"),
        Err(e) => {
            warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
