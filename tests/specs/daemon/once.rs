// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-job runs against a temporary spool

use crate::prelude::*;

#[test]
fn undecodable_job_is_reported_as_exception() {
    let project = Project::new();
    project.submit("bad", "not json");

    thd().config(&project.config_path()).args(&["--once"]).passes();

    let status = project.status("bad");
    assert_eq!(status.len(), 1);
    assert_eq!(status[0]["type"], "exception");
    assert!(status[0]["message"].as_str().unwrap().starts_with("invalid job payload"));
}

#[test]
fn rejected_repo_reports_info_progress_and_exception() {
    let project = Project::new();
    project.submit("job-1", r#"{"repo": "../escape", "ref": "refs/changes/1"}"#);

    thd().config(&project.config_path()).args(&["--once"]).passes();

    let status = project.status("job-1");
    let types: Vec<_> = status.iter().map(|r| r["type"].as_str().unwrap()).collect();
    assert_eq!(types, vec!["data", "status", "exception"]);
    assert_eq!(status[0]["body"]["name"], "sql-migrate-test-runner-spec-host");
    assert_eq!(status[1]["current"], 1);
    assert_eq!(status[1]["total"], 4);
    assert!(project.spool().join("claimed").join("job-1.json").exists());
}

#[test]
fn once_handles_only_the_first_job() {
    let project = Project::new();
    project.submit("a", "not json");
    project.submit("b", "not json");

    thd().config(&project.config_path()).args(&["--once"]).passes();

    assert_eq!(project.status("a").len(), 1);
    assert!(project.status("b").is_empty());
    assert!(project.spool().join("incoming").join("b.json").exists());
}

#[test]
fn spool_dir_can_come_from_env() {
    let project = Project::new();
    let spool = project.root().join("other-spool");
    let incoming = spool.join("incoming");
    std::fs::create_dir_all(&incoming).unwrap();
    std::fs::write(incoming.join("bad.json"), "not json").unwrap();

    thd().config(&project.config_path()).env("TH_SPOOL_DIR", &spool).args(&["--once"]).passes();

    assert!(spool.join("status").join("bad.jsonl").exists());
}

#[test]
fn log_dir_receives_daemon_log() {
    let project = Project::new();
    let logs = project.root().join("logs");
    project.submit("bad", "not json");

    thd().config(&project.config_path()).env("TH_LOG_DIR", &logs).args(&["--once"]).passes();

    let log = std::fs::read_to_string(logs.join("thd.log")).unwrap();
    assert!(log.contains("undecodable job arguments"), "{log}");
}
