// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! th-adapters: collaborators the job pipeline talks to
//!
//! Each collaborator is a trait with a production implementation and, behind
//! the `test-support` feature, a recording fake.

pub mod analyzer;
pub mod fetch;
pub mod queue;
pub mod registry;
pub mod subprocess;
pub mod validator;

#[cfg(any(test, feature = "test-support"))]
pub mod call_log;

pub use analyzer::{AnalyzeError, LogAnalyzer, MarkerLogAnalyzer, DEFAULT_ERROR_MARKERS};
pub use fetch::{FetchError, GitFetcher, SourceFetcher};
pub use queue::{
    ClaimedJob, JobQueue, QueueError, SpoolQueue, SpoolSink, StatusRecord, StatusSignal,
    StatusSink,
};
pub use registry::{DatasetRegistry, DirDatasetRegistry, MemoryDatasetRegistry, RegistryError};
pub use subprocess::SubprocessError;
pub use validator::{
    CommandValidator, ExternalValidator, LogArtifact, ValidationExit, ValidationRequest,
    ValidatorError,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use analyzer::FakeLogAnalyzer;
#[cfg(any(test, feature = "test-support"))]
pub use call_log::{CallLog, Hook};
#[cfg(any(test, feature = "test-support"))]
pub use fetch::{FakeSourceFetcher, FetchCall};
#[cfg(any(test, feature = "test-support"))]
pub use queue::{FakeJobQueue, FakeStatusSink, SinkCall};
#[cfg(any(test, feature = "test-support"))]
pub use validator::{FakeValidator, ValidatorCall};
