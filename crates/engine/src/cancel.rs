// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stop and cancel checkpoints between pipeline steps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use th_adapters::StatusSink;
use th_core::Job;
use tokio_util::sync::CancellationToken;

use crate::error::{AbortReason, PipelineError};
use crate::reporter::StatusReporter;

/// Result recorded when the worker is shutting down mid-job.
pub const STOPPED_RESULT: &str = "Failed: Worker interrupted/stopped";

/// Result recorded when the dispatcher cancelled the job.
pub const CANCELLED_RESULT: &str = "Failed: Job cancelled";

/// Cancelled flag for one job.
///
/// Set from outside the worker task; read at the next checkpoint. Once set
/// it stays set for the job's lifetime.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Evaluates the worker's stop signal and a job's cancelled flag.
///
/// Stop takes precedence over cancel: a stopping worker does not report
/// anything terminal for the job.
pub struct CancellationController {
    stop: CancellationToken,
    cancelled: CancelFlag,
}

impl CancellationController {
    pub fn new(stop: CancellationToken, cancelled: CancelFlag) -> Self {
        Self { stop, cancelled }
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.is_cancelled()
    }

    /// Run before every step.
    ///
    /// On stop: records [`STOPPED_RESULT`], sends the current progress and
    /// aborts with no terminal signal. On cancel: records
    /// [`CANCELLED_RESULT`], sends progress then fail, and aborts. Transport
    /// errors while reporting are logged; the abort still wins.
    pub async fn checkpoint<S: StatusSink>(
        &self,
        job: &mut Job,
        reporter: &mut StatusReporter<S>,
    ) -> Result<(), PipelineError> {
        if self.stop_requested() {
            tracing::info!(progress = %job.progress, "worker stopping, abandoning job");
            job.set_result(STOPPED_RESULT);
            if let Err(e) = reporter.send_progress(job.progress).await {
                tracing::warn!(error = %e, "failed to report progress on stop");
            }
            return Err(PipelineError::Aborted(AbortReason::Stopped));
        }

        if self.is_cancelled() {
            tracing::info!(progress = %job.progress, "job cancelled");
            job.set_result(CANCELLED_RESULT);
            if let Err(e) = reporter.send_progress(job.progress).await {
                tracing::warn!(error = %e, "failed to report progress on cancel");
            }
            if let Err(e) = reporter.send_fail().await {
                tracing::warn!(error = %e, "failed to report cancelled job");
            }
            return Err(PipelineError::Aborted(AbortReason::Cancelled));
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
