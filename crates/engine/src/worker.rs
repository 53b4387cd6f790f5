// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker loop: claim a job, run the pipeline, report, repeat.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use th_adapters::{ClaimedJob, JobQueue, QueueError, StatusSink};
use th_core::{InfoPayload, Job, JobArgs, JobId, Progress};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::cancel::{CancelFlag, CancellationController};
use crate::error::{AbortReason, PipelineError};
use crate::pipeline::{PipelineOutcome, StepPipeline};
use crate::reporter::{StatusReporter, Terminal};

/// Result recorded for a job that passed every step.
pub const PASSED_RESULT: &str = "Passed";

/// Worker loop tuning.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Delay before claiming again after a transport error
    pub claim_retry_delay: Duration,
    /// Stop after this many claimed jobs; `None` runs until stopped
    pub max_jobs: Option<u32>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { claim_retry_delay: Duration::from_secs(5), max_jobs: None }
    }
}

/// Observable state of the worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Claimed,
    Running,
    Completed,
    Failed,
    Excepted,
    Stopped,
}

th_core::simple_display! {
    WorkerState {
        Idle => "idle",
        Claimed => "claimed",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Excepted => "excepted",
        Stopped => "stopped",
    }
}

/// How a claimed job ended.
///
/// A terminal signal whose delivery failed still decides the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// complete was sent
    Completed,
    /// fail was sent (log errors or cancellation)
    Failed,
    /// exception was sent
    Excepted,
    /// abandoned because the worker is stopping; nothing terminal sent
    Stopped,
}

th_core::simple_display! {
    JobOutcome {
        Completed => "completed",
        Failed => "failed",
        Excepted => "excepted",
        Stopped => "stopped",
    }
}

impl From<Terminal> for JobOutcome {
    fn from(terminal: Terminal) -> Self {
        match terminal {
            Terminal::Complete => JobOutcome::Completed,
            Terminal::Fail => JobOutcome::Failed,
            Terminal::Exception => JobOutcome::Excepted,
        }
    }
}

impl From<JobOutcome> for WorkerState {
    fn from(outcome: JobOutcome) -> Self {
        match outcome {
            JobOutcome::Completed => WorkerState::Completed,
            JobOutcome::Failed => WorkerState::Failed,
            JobOutcome::Excepted => WorkerState::Excepted,
            JobOutcome::Stopped => WorkerState::Stopped,
        }
    }
}

/// Summary of one claimed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub id: JobId,
    pub outcome: JobOutcome,
    pub progress: Progress,
    pub result: Option<String>,
}

struct ActiveJob {
    id: JobId,
    cancelled: CancelFlag,
}

type ActiveSlot = Arc<Mutex<Option<ActiveJob>>>;

/// Control surface for a running [`WorkerLoop`], usable from other tasks.
#[derive(Clone)]
pub struct WorkerHandle {
    stop: CancellationToken,
    active: ActiveSlot,
    state: watch::Receiver<WorkerState>,
}

impl WorkerHandle {
    /// Ask the worker to stop.
    ///
    /// A pending claim is ended by shutting the queue down. A running job is
    /// abandoned at its next checkpoint without a terminal signal.
    pub fn stop(&self) {
        tracing::info!("stop requested");
        self.stop.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Mark the active job as cancelled if its ID matches.
    ///
    /// Returns whether a job was marked. The job fails at its next
    /// checkpoint.
    pub fn request_cancel(&self, job_id: &str) -> bool {
        let active = self.active.lock();
        match active.as_ref() {
            Some(job) if job.id == job_id => {
                tracing::info!(job_id, "cancel requested");
                job.cancelled.cancel();
                true
            }
            _ => {
                tracing::debug!(job_id, "cancel request does not match the active job");
                false
            }
        }
    }

    /// ID of the job currently being worked on
    pub fn active_job(&self) -> Option<JobId> {
        self.active.lock().as_ref().map(|job| job.id.clone())
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.clone()
    }
}

/// Claims jobs one at a time and drives each through the pipeline.
pub struct WorkerLoop<Q: JobQueue> {
    queue: Arc<Q>,
    pipeline: StepPipeline,
    info: InfoPayload,
    config: WorkerConfig,
    stop: CancellationToken,
    active: ActiveSlot,
    state: watch::Sender<WorkerState>,
}

impl<Q: JobQueue> WorkerLoop<Q> {
    pub fn new(
        queue: Arc<Q>,
        pipeline: StepPipeline,
        info: InfoPayload,
        config: WorkerConfig,
    ) -> (Self, WorkerHandle) {
        let stop = CancellationToken::new();
        let active: ActiveSlot = Arc::new(Mutex::new(None));
        let (state, state_rx) = watch::channel(WorkerState::Idle);
        let handle = WorkerHandle { stop: stop.clone(), active: Arc::clone(&active), state: state_rx };
        let worker = Self { queue, pipeline, info, config, stop, active, state };
        (worker, handle)
    }

    /// Run until stopped, the queue shuts down, or `max_jobs` is reached.
    ///
    /// Returns a report per claimed job, in claim order.
    pub async fn run(self) -> Vec<JobReport> {
        let mut reports = Vec::new();
        let mut queue_closed = false;
        tracing::info!(max_jobs = ?self.config.max_jobs, "worker loop started");

        loop {
            if self.stop.is_cancelled() {
                break;
            }
            if let Some(max) = self.config.max_jobs {
                if reports.len() >= max as usize {
                    tracing::info!(max, "job limit reached");
                    break;
                }
            }

            self.set_state(WorkerState::Idle);
            let claim = self.queue.claim();
            tokio::pin!(claim);
            let claimed = tokio::select! {
                biased;
                claimed = &mut claim => claimed,
                _ = self.stop.cancelled() => {
                    // The pending claim settles after shutdown; a job it already
                    // took is still run and abandoned at its first checkpoint.
                    self.queue.shutdown().await;
                    queue_closed = true;
                    claim.await
                }
            };

            match claimed {
                Ok(job) => reports.push(self.handle(job).await),
                Err(QueueError::Shutdown) => {
                    tracing::info!("queue shut down");
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        retry_in = ?self.config.claim_retry_delay,
                        "failed to claim job"
                    );
                    tokio::select! {
                        biased;
                        _ = self.stop.cancelled() => break,
                        _ = tokio::time::sleep(self.config.claim_retry_delay) => {}
                    }
                }
            }
        }

        self.set_state(WorkerState::Stopped);
        if !queue_closed {
            self.queue.shutdown().await;
        }
        tracing::info!(jobs = reports.len(), "worker loop stopped");
        reports
    }

    fn set_state(&self, state: WorkerState) {
        self.state.send_replace(state);
    }

    async fn handle(&self, claimed: ClaimedJob<Q::Sink>) -> JobReport {
        let ClaimedJob { id, payload, sink } = claimed;
        self.set_state(WorkerState::Claimed);

        let cancelled = CancelFlag::new();
        *self.active.lock() = Some(ActiveJob { id: id.clone(), cancelled: cancelled.clone() });
        let controller = CancellationController::new(self.stop.clone(), cancelled);
        let reporter = StatusReporter::new(id.clone(), sink);

        let span = tracing::info_span!("job", job_id = %id);
        let report = self.run_job(id, &payload, &controller, reporter).instrument(span).await;

        *self.active.lock() = None;
        self.set_state(report.outcome.into());
        report
    }

    async fn run_job(
        &self,
        id: JobId,
        payload: &[u8],
        controller: &CancellationController,
        mut reporter: StatusReporter<Q::Sink>,
    ) -> JobReport {
        let args = match JobArgs::decode(payload) {
            Ok(args) => args,
            Err(e) => {
                tracing::error!(error = %e, "undecodable job arguments");
                let message = PipelineError::from(e).to_string();
                send_exception(&mut reporter, &message).await;
                return JobReport {
                    id,
                    outcome: JobOutcome::Excepted,
                    progress: Progress::default(),
                    result: Some(format!("Exception: {message}")),
                };
            }
        };

        tracing::info!(repo = %args.repo, reference = %args.reference, "claimed job");
        let mut job = Job::new(id, args);
        self.set_state(WorkerState::Running);

        let outcome = match self.execute(&mut job, controller, &mut reporter).await {
            Ok(PipelineOutcome::Passed) => JobOutcome::Completed,
            Ok(PipelineOutcome::Failed) => JobOutcome::Failed,
            Err(PipelineError::Aborted(AbortReason::Stopped)) => JobOutcome::Stopped,
            Err(PipelineError::Aborted(AbortReason::Cancelled)) => JobOutcome::Failed,
            Err(e) => match reporter.terminal() {
                Some(sent) => {
                    tracing::warn!(error = %e, %sent, "terminal signal was not delivered");
                    sent.into()
                }
                None if controller.is_cancelled() => {
                    // Cancelled mid-step: the step's error is a symptom, report fail
                    tracing::info!(error = %e, "cancelled job ended with an error");
                    job.set_result(crate::cancel::CANCELLED_RESULT);
                    if let Err(e) = reporter.send_fail().await {
                        tracing::warn!(error = %e, "failed to report cancelled job");
                    }
                    JobOutcome::Failed
                }
                None => {
                    tracing::error!(error = %e, progress = %job.progress, "job failed unexpectedly");
                    let message = e.to_string();
                    job.set_result(format!("Exception: {message}"));
                    send_exception(&mut reporter, &message).await;
                    JobOutcome::Excepted
                }
            },
        };

        tracing::info!(%outcome, progress = %job.progress, result = ?job.result(), "job finished");
        JobReport {
            outcome,
            progress: job.progress,
            result: job.result().map(str::to_string),
            id: job.id,
        }
    }

    /// Info, the pipeline, then the success tail: final progress slot, info
    /// again, complete.
    async fn execute(
        &self,
        job: &mut Job,
        controller: &CancellationController,
        reporter: &mut StatusReporter<Q::Sink>,
    ) -> Result<PipelineOutcome, PipelineError> {
        reporter.send_info(&self.info).await?;

        let outcome = self.pipeline.run(job, controller, reporter).await?;
        if outcome == PipelineOutcome::Passed {
            job.progress.advance();
            reporter.send_progress(job.progress).await?;
            reporter.send_info(&self.info).await?;
            job.set_result(PASSED_RESULT);
            reporter.send_complete(&self.info).await?;
        }
        Ok(outcome)
    }
}

async fn send_exception<S: StatusSink>(reporter: &mut StatusReporter<S>, message: &str) {
    if let Err(e) = reporter.send_exception(message).await {
        tracing::warn!(error = %e, "failed to report exception");
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
