// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use th_adapters::{FakeStatusSink, SinkCall};

struct Harness {
    stop: CancellationToken,
    cancelled: CancelFlag,
    controller: CancellationController,
    reporter: StatusReporter<FakeStatusSink>,
    sink: FakeStatusSink,
    job: Job,
}

fn setup() -> Harness {
    let stop = CancellationToken::new();
    let cancelled = CancelFlag::new();
    let sink = FakeStatusSink::new();
    let job = Job::builder().id("job-1").build();
    Harness {
        controller: CancellationController::new(stop.clone(), cancelled.clone()),
        reporter: StatusReporter::new(job.id.clone(), sink.clone()),
        stop,
        cancelled,
        sink,
        job,
    }
}

#[tokio::test]
async fn passes_when_neither_flag_is_set() {
    let mut h = setup();
    h.controller.checkpoint(&mut h.job, &mut h.reporter).await.unwrap();
    assert!(h.sink.calls().is_empty());
    assert_eq!(h.job.result(), None);
}

#[tokio::test]
async fn stop_reports_progress_without_terminal() {
    let mut h = setup();
    h.job.progress.advance();
    h.stop.cancel();

    let err = h.controller.checkpoint(&mut h.job, &mut h.reporter).await.unwrap_err();

    assert!(matches!(err, PipelineError::Aborted(AbortReason::Stopped)));
    assert_eq!(h.job.result(), Some(STOPPED_RESULT));
    assert_eq!(h.sink.calls(), vec![SinkCall::Status(1, 4)]);
    assert_eq!(h.reporter.terminal(), None);
}

#[tokio::test]
async fn cancel_reports_progress_then_fail() {
    let mut h = setup();
    h.cancelled.cancel();

    let err = h.controller.checkpoint(&mut h.job, &mut h.reporter).await.unwrap_err();

    assert!(matches!(err, PipelineError::Aborted(AbortReason::Cancelled)));
    assert_eq!(h.job.result(), Some(CANCELLED_RESULT));
    assert_eq!(h.sink.calls(), vec![SinkCall::Status(0, 4), SinkCall::Fail]);
}

#[tokio::test]
async fn stop_takes_precedence_over_cancel() {
    let mut h = setup();
    h.cancelled.cancel();
    h.stop.cancel();

    let err = h.controller.checkpoint(&mut h.job, &mut h.reporter).await.unwrap_err();

    assert!(matches!(err, PipelineError::Aborted(AbortReason::Stopped)));
    assert!(h.sink.terminals().is_empty());
}

#[tokio::test]
async fn abort_survives_transport_errors() {
    let mut h = setup();
    h.sink.fail_sends();
    h.cancelled.cancel();

    let err = h.controller.checkpoint(&mut h.job, &mut h.reporter).await.unwrap_err();

    assert!(matches!(err, PipelineError::Aborted(AbortReason::Cancelled)));
    assert_eq!(h.reporter.terminal(), Some(crate::reporter::Terminal::Fail));
}

#[test]
fn cancel_flag_is_shared_and_sticky() {
    let flag = CancelFlag::new();
    let other = flag.clone();
    assert!(!flag.is_cancelled());
    other.cancel();
    other.cancel();
    assert!(flag.is_cancelled());
}
