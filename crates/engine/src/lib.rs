// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! th-engine: job lifecycle for the gate worker
//!
//! [`WorkerLoop`] claims one job at a time from a [`th_adapters::JobQueue`],
//! runs it through the [`StepPipeline`] and reports its outcome through a
//! [`StatusReporter`]. [`WorkerHandle`] stops the loop or cancels the
//! active job from other tasks.

mod cancel;
mod error;
mod pipeline;
mod reporter;
mod worker;

pub use cancel::{CancelFlag, CancellationController, CANCELLED_RESULT, STOPPED_RESULT};
pub use error::{AbortReason, PipelineError, ReportError};
pub use pipeline::{PipelineDeps, PipelineOutcome, Step, StepPipeline, LOG_ERRORS_RESULT};
pub use reporter::{StatusReporter, Terminal};
pub use worker::{
    JobOutcome, JobReport, WorkerConfig, WorkerHandle, WorkerLoop, WorkerState, PASSED_RESULT,
};
