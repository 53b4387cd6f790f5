// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::lifecycle::test_helpers::config_in;

#[test]
fn creates_working_directories() {
    let root = tempfile::tempdir().unwrap();
    let config = config_in(root.path());

    let daemon = startup(&config, "gate-01", None).unwrap();

    assert!(config.job_working_dir.is_dir());
    assert!(config.git_working_dir.join("sql-migrate-test-runner-gate-01").is_dir());
    assert!(config.queue.spool_dir.join("incoming").is_dir());
    assert_eq!(daemon.identity.name, "sql-migrate-test-runner-gate-01");
}

#[test]
fn configured_identity_names_the_checkout_root() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config_in(root.path());
    config.worker.name = Some("gate-worker".to_string());

    startup(&config, "gate-01", None).unwrap();

    assert!(config.git_working_dir.join("gate-worker").is_dir());
}

#[test]
fn invalid_config_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config_in(root.path());
    config.max_jobs = Some(0);

    let err = startup(&config, "gate-01", None).err().unwrap();
    assert!(matches!(err, LifecycleError::Config(_)));
}

#[test]
fn unusable_job_dir_is_reported() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config_in(root.path());
    std::fs::write(root.path().join("blocker"), "file").unwrap();
    config.job_working_dir = root.path().join("blocker").join("jobs");

    let err = startup(&config, "gate-01", None).err().unwrap();
    assert!(matches!(err, LifecycleError::Dir { .. }));
}

#[test]
fn unusable_spool_dir_is_queue_error() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config_in(root.path());
    std::fs::write(root.path().join("blocker"), "file").unwrap();
    config.queue.spool_dir = root.path().join("blocker").join("spool");

    let err = startup(&config, "gate-01", None).err().unwrap();
    assert!(matches!(err, LifecycleError::Queue(_)));
}
