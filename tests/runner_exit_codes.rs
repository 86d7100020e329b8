// tests/runner_exit_codes.rs
#![cfg(unix)]

use std::error::Error;
use std::sync::Arc;

use runexe::exec::{AbnormalReason, CancellationToken, ExitCode, ProcessRunner};
use runexe_test_utils::{RecordingSink, init_tracing, sh, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn zero_exit_is_success() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();

    let status = with_timeout(ProcessRunner::default().run(
        sh("echo hello"),
        Arc::new(sink.clone()),
        CancellationToken::new(),
    ))
    .await?;

    assert!(status.success());
    assert_eq!(status.code, ExitCode::Exited(0));
    assert_eq!(status.combined_output, "hello\n");
    assert_eq!(sink.assert_completed_once(), status);
    Ok(())
}

#[tokio::test]
async fn positive_exit_code_is_propagated() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();

    let status = with_timeout(ProcessRunner::default().run(
        sh("echo failing; exit 7"),
        Arc::new(sink.clone()),
        CancellationToken::new(),
    ))
    .await?;

    assert_eq!(status.exit_code(), Some(7));
    assert!(!status.success());
    assert!(!status.is_abnormal());
    assert_eq!(status.combined_output, "failing\n");
    sink.assert_completed_once();
    Ok(())
}

#[tokio::test]
async fn killed_process_reports_signal() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();

    let status = with_timeout(ProcessRunner::default().run(
        sh("kill -9 $$"),
        Arc::new(sink.clone()),
        CancellationToken::new(),
    ))
    .await?;

    assert_eq!(status.code, ExitCode::Abnormal(AbnormalReason::Signaled(9)));
    assert_eq!(status.exit_code(), None);
    sink.assert_completed_once();
    Ok(())
}

#[tokio::test]
async fn stderr_is_merged_in_write_order() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();

    let status = with_timeout(ProcessRunner::default().run(
        sh("for i in 1 2 3 4 5 6 7 8; do echo out$i; echo err$i >&2; done"),
        Arc::new(sink.clone()),
        CancellationToken::new(),
    ))
    .await?;

    let expected: String = (1..=8).map(|i| format!("out{i}\nerr{i}\n")).collect();
    assert!(status.success());
    assert_eq!(status.combined_output, expected);
    assert_eq!(sink.latest(), expected);
    Ok(())
}

#[tokio::test]
async fn final_line_without_newline_is_kept() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();

    let status = with_timeout(ProcessRunner::default().run(
        sh("printf 'a\\nno-newline'"),
        Arc::new(sink.clone()),
        CancellationToken::new(),
    ))
    .await?;

    assert_eq!(status.combined_output, "a\nno-newline");
    assert_eq!(sink.latest(), "a\nno-newline");
    Ok(())
}
