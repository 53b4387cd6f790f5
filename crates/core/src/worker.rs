// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker identity and the informational payload derived from it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Process-wide identity of a worker instance.
///
/// Passed in explicitly at construction; nothing here reads the host
/// environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerIdentity {
    pub name: String,
    /// Fixed slot number reported to the dispatcher
    pub number: u32,
    pub manager: String,
    /// Contact URL for the worker's logs
    pub url: String,
}

impl WorkerIdentity {
    /// Conventional identity for a worker running on `host`.
    pub fn for_host(host: &str) -> Self {
        Self {
            name: format!("sql-migrate-test-runner-{host}"),
            number: 1,
            manager: format!("turbo-hipster-manager-{host}"),
            url: "http://localhost".to_string(),
        }
    }

    /// Serialize the identity into the payload sent with every info and
    /// complete signal.
    pub fn payload(&self) -> Result<InfoPayload, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(InfoPayload(bytes.into()))
    }
}

/// Serialized worker identity, computed once and shared by every job.
///
/// Cloning shares the same buffer, so repeated sends are byte-for-byte
/// identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoPayload(Arc<[u8]>);

impl InfoPayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether two payloads share the same underlying buffer.
    pub fn ptr_eq(&self, other: &InfoPayload) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
