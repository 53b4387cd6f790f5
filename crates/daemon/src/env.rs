// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Config file name under the platform config directory
const CONFIG_FILE: &str = "turbo-hipster/config.toml";

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Resolve the config file: explicit path > TH_CONFIG > <config_dir>/turbo-hipster/config.toml
pub fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Some(path) = non_empty("TH_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(CONFIG_FILE)).ok_or(ConfigError::NoConfigDir)
}

/// Log directory override
pub fn log_dir() -> Option<PathBuf> {
    non_empty("TH_LOG_DIR").map(PathBuf::from)
}

/// Spool directory override
pub fn spool_dir() -> Option<PathBuf> {
    non_empty("TH_SPOOL_DIR").map(PathBuf::from)
}

/// Host name used for worker identity defaults: HOSTNAME > /etc/hostname > "localhost"
pub fn hostname() -> String {
    if let Some(host) = non_empty("HOSTNAME") {
        return host.trim().to_string();
    }
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
