// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound status signals for one job.

use th_adapters::StatusSink;
use th_core::{InfoPayload, JobId, Progress};

use crate::error::ReportError;

/// The three ways a job can end, as seen by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Complete,
    Fail,
    Exception,
}

th_core::simple_display! {
    Terminal {
        Complete => "complete",
        Fail => "fail",
        Exception => "exception",
    }
}

/// Sends a job's signals through its sink and guarantees exactly one
/// terminal signal.
///
/// The first terminal call wins; later terminal calls, and any info or
/// progress sent after it, are refused with [`ReportError::AlreadyTerminal`]
/// without reaching the sink.
pub struct StatusReporter<S> {
    job_id: JobId,
    sink: S,
    terminal: Option<Terminal>,
}

impl<S: StatusSink> StatusReporter<S> {
    pub fn new(job_id: JobId, sink: S) -> Self {
        Self { job_id, sink, terminal: None }
    }

    /// Terminal signal sent so far, if any.
    pub fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    pub async fn send_info(&self, payload: &InfoPayload) -> Result<(), ReportError> {
        self.ensure_open()?;
        tracing::debug!(job_id = %self.job_id, "sending work data");
        self.sink.send_data(payload.as_bytes()).await?;
        Ok(())
    }

    pub async fn send_progress(&self, progress: Progress) -> Result<(), ReportError> {
        self.ensure_open()?;
        tracing::debug!(job_id = %self.job_id, %progress, "sending work status");
        self.sink.send_status(progress.current(), progress.total()).await?;
        Ok(())
    }

    pub async fn send_complete(&mut self, payload: &InfoPayload) -> Result<(), ReportError> {
        self.claim_terminal(Terminal::Complete)?;
        self.sink.send_complete(payload.as_bytes()).await?;
        Ok(())
    }

    pub async fn send_fail(&mut self) -> Result<(), ReportError> {
        self.claim_terminal(Terminal::Fail)?;
        self.sink.send_fail().await?;
        Ok(())
    }

    pub async fn send_exception(&mut self, message: &str) -> Result<(), ReportError> {
        self.claim_terminal(Terminal::Exception)?;
        self.sink.send_exception(message).await?;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), ReportError> {
        match self.terminal {
            Some(sent) => Err(ReportError::AlreadyTerminal(sent)),
            None => Ok(()),
        }
    }

    /// Record `terminal` before sending, so a transport failure can never
    /// lead to a second terminal signal.
    fn claim_terminal(&mut self, terminal: Terminal) -> Result<(), ReportError> {
        if let Some(sent) = self.terminal {
            tracing::warn!(
                job_id = %self.job_id,
                %sent,
                refused = %terminal,
                "refusing second terminal signal"
            );
            return Err(ReportError::AlreadyTerminal(sent));
        }
        tracing::info!(job_id = %self.job_id, %terminal, "sending terminal signal");
        self.terminal = Some(terminal);
        Ok(())
    }
}

#[cfg(test)]
#[path = "reporter_tests.rs"]
mod tests;
