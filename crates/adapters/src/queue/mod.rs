// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job queue transport: claiming jobs and reporting their status.

mod spool;

pub use spool::{SpoolQueue, SpoolSink, StatusRecord, StatusSignal};

use async_trait::async_trait;
use th_core::JobId;
use thiserror::Error;

/// Errors from the job queue transport.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is shut down")]
    Shutdown,

    #[error("queue unavailable: {0}")]
    Unavailable(String),

    #[error("malformed claim: {0}")]
    Malformed(String),

    #[error("failed to encode status: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("queue io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound status channel for one claimed job.
///
/// The dispatcher observes these signals; the worker guarantees exactly one
/// of `send_complete`, `send_fail`, `send_exception` per job.
#[async_trait]
pub trait StatusSink: Send + Sync + 'static {
    /// Informational payload (worker identity)
    async fn send_data(&self, payload: &[u8]) -> Result<(), QueueError>;

    /// Progress update
    async fn send_status(&self, current: u32, total: u32) -> Result<(), QueueError>;

    /// Terminal success, carrying the informational payload as body
    async fn send_complete(&self, payload: &[u8]) -> Result<(), QueueError>;

    /// Terminal failure, no body
    async fn send_fail(&self) -> Result<(), QueueError>;

    /// Terminal unexpected error, carrying its description
    async fn send_exception(&self, message: &str) -> Result<(), QueueError>;
}

/// A job handed to this worker by the queue.
pub struct ClaimedJob<S> {
    pub id: JobId,
    /// Raw arguments payload, decoded by the worker
    pub payload: Vec<u8>,
    pub sink: S,
}

/// Source of jobs for a worker.
#[async_trait]
pub trait JobQueue: Send + Sync + 'static {
    type Sink: StatusSink;

    /// Wait for the next job.
    ///
    /// Blocks until a job is available. Callers race this against their own
    /// stop signal; after `shutdown` it fails with [`QueueError::Shutdown`].
    async fn claim(&self) -> Result<ClaimedJob<Self::Sink>, QueueError>;

    /// Stop waiting for jobs and disconnect from the transport.
    async fn shutdown(&self);
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ClaimedJob, JobQueue, QueueError, StatusSink};
    use crate::call_log::Hook;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use th_core::JobId;
    use tokio_util::sync::CancellationToken;

    /// Recorded status signal
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SinkCall {
        Data(Vec<u8>),
        Status(u32, u32),
        Complete(Vec<u8>),
        Fail,
        Exception(String),
    }

    impl SinkCall {
        pub fn is_terminal(&self) -> bool {
            matches!(self, SinkCall::Complete(_) | SinkCall::Fail | SinkCall::Exception(_))
        }
    }

    #[derive(Default)]
    struct FakeSinkState {
        calls: Vec<SinkCall>,
        on_data: Option<Hook>,
        fail_sends: bool,
        fail_terminals: bool,
    }

    /// Fake status sink recording every signal
    #[derive(Clone, Default)]
    pub struct FakeStatusSink {
        inner: Arc<Mutex<FakeSinkState>>,
    }

    impl FakeStatusSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Run `hook` every time an informational payload is sent.
        pub fn on_data(&self, hook: Hook) {
            self.inner.lock().on_data = Some(hook);
        }

        /// Make every send fail with `Unavailable` (calls are still recorded).
        pub fn fail_sends(&self) {
            self.inner.lock().fail_sends = true;
        }

        /// Make only terminal sends fail (calls are still recorded).
        pub fn fail_terminals(&self) {
            self.inner.lock().fail_terminals = true;
        }

        /// Get all recorded signals
        pub fn calls(&self) -> Vec<SinkCall> {
            self.inner.lock().calls.clone()
        }

        /// Only the terminal signals
        pub fn terminals(&self) -> Vec<SinkCall> {
            self.calls().into_iter().filter(SinkCall::is_terminal).collect()
        }

        /// Only the progress updates
        pub fn statuses(&self) -> Vec<(u32, u32)> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    SinkCall::Status(current, total) => Some((current, total)),
                    _ => None,
                })
                .collect()
        }

        fn push(&self, call: SinkCall) -> Result<(), QueueError> {
            let (hook, fail) = {
                let mut inner = self.inner.lock();
                let hook = match call {
                    SinkCall::Data(_) => inner.on_data.clone(),
                    _ => None,
                };
                let fail = inner.fail_sends || (inner.fail_terminals && call.is_terminal());
                inner.calls.push(call);
                (hook, fail)
            };
            if let Some(hook) = hook {
                hook();
            }
            if fail {
                return Err(QueueError::Unavailable("fake sink down".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl StatusSink for FakeStatusSink {
        async fn send_data(&self, payload: &[u8]) -> Result<(), QueueError> {
            self.push(SinkCall::Data(payload.to_vec()))
        }

        async fn send_status(&self, current: u32, total: u32) -> Result<(), QueueError> {
            self.push(SinkCall::Status(current, total))
        }

        async fn send_complete(&self, payload: &[u8]) -> Result<(), QueueError> {
            self.push(SinkCall::Complete(payload.to_vec()))
        }

        async fn send_fail(&self) -> Result<(), QueueError> {
            self.push(SinkCall::Fail)
        }

        async fn send_exception(&self, message: &str) -> Result<(), QueueError> {
            self.push(SinkCall::Exception(message.to_string()))
        }
    }

    enum Scripted {
        Job { id: JobId, payload: Vec<u8> },
        Error(String),
    }

    #[derive(Default)]
    struct FakeQueueState {
        script: VecDeque<Scripted>,
        sinks: HashMap<JobId, FakeStatusSink>,
        claimed: Vec<JobId>,
        shutdown_calls: usize,
        hold_claims: bool,
    }

    /// Fake job queue serving scripted jobs and claim errors in order.
    ///
    /// Once the script is exhausted `claim` blocks until `shutdown`.
    #[derive(Clone)]
    pub struct FakeJobQueue {
        inner: Arc<Mutex<FakeQueueState>>,
        closed: CancellationToken,
    }

    impl Default for FakeJobQueue {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeQueueState::default())),
                closed: CancellationToken::new(),
            }
        }
    }

    impl FakeJobQueue {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a job and return the sink its signals will be recorded on.
        pub fn push_job(&self, id: impl Into<JobId>, payload: impl Into<Vec<u8>>) -> FakeStatusSink {
            let id = id.into();
            let sink = FakeStatusSink::new();
            let mut inner = self.inner.lock();
            inner.sinks.insert(id.clone(), sink.clone());
            inner.script.push_back(Scripted::Job { id, payload: payload.into() });
            sink
        }

        /// Hand out each job only once `shutdown` is called, like a transport
        /// that has already committed a claim when the worker stops.
        pub fn hold_claims(&self) {
            self.inner.lock().hold_claims = true;
        }

        /// Queue a claim failure.
        pub fn push_error(&self, message: impl Into<String>) {
            self.inner.lock().script.push_back(Scripted::Error(message.into()));
        }

        /// Sink for a previously pushed job
        pub fn sink(&self, id: &str) -> Option<FakeStatusSink> {
            self.inner.lock().sinks.get(id).cloned()
        }

        /// IDs claimed so far, in order
        pub fn claimed(&self) -> Vec<JobId> {
            self.inner.lock().claimed.clone()
        }

        /// Scripted entries not yet handed out
        pub fn remaining(&self) -> usize {
            self.inner.lock().script.len()
        }

        pub fn shutdown_calls(&self) -> usize {
            self.inner.lock().shutdown_calls
        }
    }

    #[async_trait]
    impl JobQueue for FakeJobQueue {
        type Sink = FakeStatusSink;

        async fn claim(&self) -> Result<ClaimedJob<FakeStatusSink>, QueueError> {
            if self.closed.is_cancelled() {
                return Err(QueueError::Shutdown);
            }
            let (next, hold) = {
                let mut inner = self.inner.lock();
                let next = match inner.script.pop_front() {
                    Some(Scripted::Job { id, payload }) => {
                        inner.claimed.push(id.clone());
                        let sink = inner.sinks.get(&id).cloned().unwrap_or_default();
                        Some(Ok(ClaimedJob { id, payload, sink }))
                    }
                    Some(Scripted::Error(message)) => Some(Err(QueueError::Unavailable(message))),
                    None => None,
                };
                (next, inner.hold_claims)
            };
            if hold && matches!(next, Some(Ok(_))) {
                self.closed.cancelled().await;
            }
            match next {
                Some(result) => result,
                None => {
                    self.closed.cancelled().await;
                    Err(QueueError::Shutdown)
                }
            }
        }

        async fn shutdown(&self) {
            self.inner.lock().shutdown_calls += 1;
            self.closed.cancel();
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeJobQueue, FakeStatusSink, SinkCall};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
