// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI help output specs

use crate::prelude::*;

#[test]
fn thd_help_shows_usage_and_flags() {
    thd().args(&["--help"]).passes().stdout_has("Usage:").stdout_has("--config").stdout_has("--once");
}

#[test]
fn thd_version_shows_version() {
    thd().args(&["--version"]).passes().stdout_has("0.2");
}

#[test]
fn thd_rejects_unknown_flags() {
    thd().args(&["--bogus"]).fails().stderr_has("--bogus");
}
