// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types.

use th_adapters::{AnalyzeError, FetchError, QueueError, RegistryError, ValidatorError};
use th_core::ArgsError;
use thiserror::Error;

use crate::reporter::Terminal;

/// Why a checkpoint refused to let the next step begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The whole worker is shutting down
    Stopped,
    /// This job was cancelled by the dispatcher
    Cancelled,
}

th_core::simple_display! {
    AbortReason {
        Stopped => "stopped",
        Cancelled => "cancelled",
    }
}

/// Errors from the status reporter.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("terminal signal already sent ({0})")]
    AlreadyTerminal(Terminal),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Errors that end a job's pipeline early.
///
/// Everything except [`PipelineError::Aborted`] is unexpected and is
/// reported to the dispatcher as an exception.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("step aborted: {0}")]
    Aborted(AbortReason),

    #[error(transparent)]
    Args(#[from] ArgsError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Validator(#[from] ValidatorError),

    #[error(transparent)]
    Analyze(#[from] AnalyzeError),

    #[error("status report failed: {0}")]
    Report(#[from] ReportError),
}
