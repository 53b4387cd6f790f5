// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! th-core: shared types for the gate worker

pub mod macros;

pub mod dataset;
pub mod id;
pub mod job;
pub mod log_paths;
pub mod worker;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use dataset::{DatasetPreset, PresetConfig, PRESET_CONFIG_FILE};
#[cfg(any(test, feature = "test-support"))]
pub use dataset::DatasetPresetBuilder;
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
pub use job::{ArgsError, Job, JobArgs, JobId, Progress, TOTAL_STEPS};
pub use worker::{InfoPayload, WorkerIdentity};
