// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier, decoded arguments, and per-job progress.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a claimed job.
    ///
    /// Assigned by the job queue at claim time and used to address status
    /// signals, cancel requests, and per-job log artifacts.
    pub struct JobId;
}

/// Number of progress slots reported for every job: the step-0 baseline,
/// one per pipeline step, and the final completion slot.
pub const TOTAL_STEPS: u32 = 4;

const REPO_KEYS: &[&str] = &["repo", "project", "ZUUL_PROJECT"];
const REF_KEYS: &[&str] = &["ref", "reference", "ZUUL_REF"];

/// Errors decoding the inbound job payload.
#[derive(Debug, Error)]
pub enum ArgsError {
    #[error("invalid job payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("job payload must be a JSON object")]
    NotAnObject,

    #[error("job payload is missing required field '{0}'")]
    Missing(&'static str),

    #[error("job payload field '{0}' must be a string")]
    NotAString(String),
}

/// Arguments supplied by the dispatcher for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobArgs {
    /// Source repository identifier (e.g. `nova`)
    pub repo: String,
    /// Reference to fetch and check out (e.g. `refs/changes/1/1/1`)
    #[serde(rename = "ref")]
    pub reference: String,
    /// Any other string arguments, passed through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl JobArgs {
    pub fn new(repo: impl Into<String>, reference: impl Into<String>) -> Self {
        Self { repo: repo.into(), reference: reference.into(), extra: BTreeMap::new() }
    }

    /// Decode a raw claim payload.
    ///
    /// Accepts the short keys (`repo`, `ref`) as well as the Zuul names
    /// (`ZUUL_PROJECT`, `ZUUL_REF`). Every value must be a string.
    pub fn decode(payload: &[u8]) -> Result<Self, ArgsError> {
        let Value::Object(mut map) = serde_json::from_slice::<Value>(payload)? else {
            return Err(ArgsError::NotAnObject);
        };

        let repo = take_first(&mut map, REPO_KEYS)?.ok_or(ArgsError::Missing("repo"))?;
        let reference = take_first(&mut map, REF_KEYS)?.ok_or(ArgsError::Missing("ref"))?;

        let mut extra = BTreeMap::new();
        for (key, value) in map {
            match value {
                Value::String(s) => {
                    extra.insert(key, s);
                }
                _ => return Err(ArgsError::NotAString(key)),
            }
        }

        Ok(Self { repo, reference, extra })
    }
}

/// Remove every alias in `keys` from `map`, returning the first one present.
fn take_first(
    map: &mut serde_json::Map<String, Value>,
    keys: &[&str],
) -> Result<Option<String>, ArgsError> {
    let mut found = None;
    for key in keys {
        match map.remove(*key) {
            Some(Value::String(s)) => {
                found.get_or_insert(s);
            }
            Some(_) => return Err(ArgsError::NotAString((*key).to_string())),
            None => {}
        }
    }
    Ok(found)
}

/// Step counter reported to the dispatcher as a progress bar.
///
/// `current` only moves forward and never exceeds `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    current: u32,
    total: u32,
}

impl Progress {
    pub fn new(total: u32) -> Self {
        Self { current: 0, total }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Move to the next slot, saturating at `total`. Returns the new value.
    pub fn advance(&mut self) -> u32 {
        if self.current < self.total {
            self.current += 1;
        }
        self.current
    }

    pub fn is_complete(&self) -> bool {
        self.current == self.total
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(TOTAL_STEPS)
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.current, self.total)
    }
}

/// A claimed job, owned by the worker loop for its whole lifetime.
///
/// A fresh `Job` is built for every claim, so progress and result never
/// leak from one job into the next.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub args: JobArgs,
    pub progress: Progress,
    result: Option<String>,
}

impl Job {
    pub fn new(id: JobId, args: JobArgs) -> Self {
        Self { id, args, progress: Progress::default(), result: None }
    }

    /// Human-readable outcome, once one has been decided.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Record the outcome. Only the first description sticks; returns
    /// whether this call set it.
    pub fn set_result(&mut self, result: impl Into<String>) -> bool {
        if self.result.is_some() {
            return false;
        }
        self.result = Some(result.into());
        true
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            id: JobId = "job-1",
        }
        set {
            args: JobArgs = JobArgs::new("nova", "refs/changes/1/1/1"),
            progress: Progress = Progress::default(),
        }
        option {
            result: String = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
