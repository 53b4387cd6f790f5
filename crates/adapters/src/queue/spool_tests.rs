// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Arc;
use tempfile::TempDir;

fn spool() -> (TempDir, SpoolQueue) {
    let dir = tempfile::tempdir().unwrap();
    let queue = SpoolQueue::open(dir.path().join("spool"), Duration::from_millis(10)).unwrap();
    (dir, queue)
}

fn submit(queue: &SpoolQueue, name: &str, payload: &str) {
    std::fs::write(queue.root().join(INCOMING).join(name), payload).unwrap();
}

fn read_records(path: &Path) -> Vec<StatusRecord> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn open_creates_layout() {
    let (_dir, queue) = spool();
    for sub in [INCOMING, CLAIMED, STATUS, CANCEL] {
        assert!(queue.root().join(sub).is_dir(), "missing {sub}");
    }
}

#[tokio::test]
async fn claims_in_name_order_and_moves_file() {
    let (_dir, queue) = spool();
    submit(&queue, "b.json", r#"{"repo": "b", "ref": "r"}"#);
    submit(&queue, "a.json", r#"{"repo": "a", "ref": "r"}"#);
    submit(&queue, "notes.txt", "ignored");

    let first = queue.claim().await.unwrap();
    assert_eq!(first.id, "a");
    assert_eq!(first.payload, br#"{"repo": "a", "ref": "r"}"#.to_vec());
    assert!(queue.root().join(CLAIMED).join("a.json").exists());
    assert!(!queue.root().join(INCOMING).join("a.json").exists());

    let second = queue.claim().await.unwrap();
    assert_eq!(second.id, "b");
}

#[tokio::test]
async fn claim_waits_for_submission() {
    let (_dir, queue) = spool();
    let queue = Arc::new(queue);

    let waiter = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.claim().await.map(|job| job.id) })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    submit(&queue, "late.json", "{}");

    let id = tokio::time::timeout(Duration::from_secs(2), waiter).await.unwrap().unwrap().unwrap();
    assert_eq!(id, "late");
}

#[tokio::test]
async fn shutdown_unblocks_pending_claim() {
    let (_dir, queue) = spool();
    let queue = Arc::new(queue);

    let waiter = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.claim().await.map(|job| job.id) })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    queue.shutdown().await;

    let result = tokio::time::timeout(Duration::from_secs(2), waiter).await.unwrap().unwrap();
    assert!(matches!(result, Err(QueueError::Shutdown)));
    assert!(matches!(queue.claim().await, Err(QueueError::Shutdown)));
}

#[tokio::test]
async fn claim_after_shutdown_leaves_jobs_in_incoming() {
    let (_dir, queue) = spool();
    submit(&queue, "job-1.json", "{}");

    queue.shutdown().await;

    assert!(matches!(queue.claim().await, Err(QueueError::Shutdown)));
    assert!(queue.root().join(INCOMING).join("job-1.json").exists());
    assert!(!queue.root().join(CLAIMED).join("job-1.json").exists());
}

#[tokio::test]
async fn sink_appends_one_record_per_signal() {
    let (_dir, queue) = spool();
    let sink = SpoolSink::new(queue.status_path("H:1"));

    sink.send_data(br#"{"name": "w"}"#).await.unwrap();
    sink.send_status(1, 4).await.unwrap();
    sink.send_exception("git fetch failed").await.unwrap();

    let signals: Vec<_> =
        read_records(sink.path()).into_iter().map(|record| record.signal).collect();
    assert_eq!(
        signals,
        vec![
            StatusSignal::Data { body: serde_json::json!({"name": "w"}) },
            StatusSignal::Status { current: 1, total: 4 },
            StatusSignal::Exception { message: "git fetch failed".to_string() },
        ]
    );
}

#[tokio::test]
async fn non_json_body_is_kept_as_string() {
    let (_dir, queue) = spool();
    let sink = SpoolSink::new(queue.status_path("j"));
    sink.send_complete(b"plain text").await.unwrap();
    sink.send_fail().await.unwrap();

    let records = read_records(sink.path());
    assert_eq!(records[0].signal, StatusSignal::Complete { body: "plain text".into() });
    assert_eq!(records[1].signal, StatusSignal::Fail);
}

#[test]
fn status_record_wire_format() {
    let line = r#"{"at":"2026-01-30T08:14:09Z","type":"status","current":2,"total":4}"#;
    let record: StatusRecord = serde_json::from_str(line).unwrap();
    assert_eq!(record.signal, StatusSignal::Status { current: 2, total: 4 });
}

#[tokio::test]
async fn cancel_requests_are_consumed() {
    let (_dir, queue) = spool();
    std::fs::write(queue.root().join(CANCEL).join("H:7"), "").unwrap();

    let ids = queue.take_cancel_requests().await.unwrap();
    assert_eq!(ids, vec![JobId::new("H:7")]);
    assert!(queue.take_cancel_requests().await.unwrap().is_empty());
}
