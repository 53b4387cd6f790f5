// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job artifact path helpers.
//!
//! Layout under the configured job working directory:
//!
//! ```text
//! <work_dir>/<job_id>/<preset>.log
//! ```

use std::path::{Path, PathBuf};

/// Directory holding every artifact of one job.
pub fn job_dir(work_dir: &Path, job_id: &str) -> PathBuf {
    work_dir.join(job_id)
}

/// Log file capturing validator output for one preset of one job.
pub fn preset_log_path(work_dir: &Path, job_id: &str, preset: &str) -> PathBuf {
    job_dir(work_dir, job_id).join(format!("{preset}.log"))
}

#[cfg(test)]
#[path = "log_paths_tests.rs"]
mod tests;
