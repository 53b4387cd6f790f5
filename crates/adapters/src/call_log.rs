// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared, ordered record of calls made across several fakes.

use parking_lot::Mutex;
use std::sync::Arc;

/// Hook run by a fake when it is called (e.g. to request a stop mid-step).
pub type Hook = Arc<dyn Fn() + Send + Sync>;

/// Ordered log of `"<collaborator>:<detail>"` entries, shared by cloning.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}
