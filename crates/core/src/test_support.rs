// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{DatasetPreset, JobArgs};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core types.
pub mod strategies {
    use crate::job::Progress;
    use proptest::prelude::*;

    /// A progress counter advanced an arbitrary number of times.
    pub fn arb_progress() -> impl Strategy<Value = Progress> {
        (0u32..16, 0usize..32).prop_map(|(total, advances)| {
            let mut progress = Progress::new(total);
            for _ in 0..advances {
                progress.advance();
            }
            progress
        })
    }
}

// ── Fixture factories ───────────────────────────────────────────────────────

/// Raw claim payload for a repo/ref pair.
pub fn job_payload(repo: &str, reference: &str) -> Vec<u8> {
    serde_json::to_vec(&JobArgs::new(repo, reference)).unwrap_or_default()
}

/// Presets named `names`, each rooted under `/datasets/<name>`.
pub fn presets(names: &[&str]) -> Vec<DatasetPreset> {
    names
        .iter()
        .map(|name| {
            DatasetPreset::builder().name(*name).path(format!("/datasets/{name}")).build()
        })
        .collect()
}
