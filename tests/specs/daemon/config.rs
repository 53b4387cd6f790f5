// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration loading specs

use crate::prelude::*;

#[test]
fn missing_config_file_fails() {
    let project = Project::new();
    let missing = project.root().join("nope.toml");
    thd().args(&["--config", missing.to_str().unwrap(), "--once"]).fails().stderr_has("nope.toml");
}

#[test]
fn malformed_config_fails() {
    let project = Project::new();
    std::fs::write(project.config_path(), "job_working_dir = [").unwrap();
    thd().config(&project.config_path()).args(&["--once"]).fails().stderr_has("invalid config");
}

#[test]
fn invalid_value_names_the_key() {
    let project = Project::new();
    project.write_config("max_jobs = 0");
    thd().config(&project.config_path()).args(&["--once"]).fails().stderr_has("max_jobs");
}
