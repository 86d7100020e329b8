// tests/runner_cancel.rs
#![cfg(unix)]

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use runexe::errors::RunnerError;
use runexe::exec::{
    AbnormalReason, CancellationToken, ExitCode, InvocationRequest, InvocationState, ProcessRunner,
    RunnerConfig,
};
use runexe_test_utils::{RecordingSink, init_tracing, sh, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// Wait until `pid` is no longer running (Linux only; elsewhere a no-op).
///
/// A zombie awaiting reaping by the runtime counts as gone.
async fn assert_process_gone(pid: u32) {
    if !Path::new("/proc/self").exists() {
        return;
    }
    let stat_path = format!("/proc/{pid}/stat");
    for _ in 0..200 {
        match std::fs::read_to_string(&stat_path) {
            Err(_) => return,
            Ok(stat) if is_zombie(&stat) => return,
            Ok(_) => {}
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("process {pid} still exists after cancellation");
}

/// `/proc/<pid>/stat` is "pid (comm) state ...".
fn is_zombie(stat: &str) -> bool {
    stat.rsplit(')')
        .next()
        .and_then(|rest| rest.split_whitespace().next())
        == Some("Z")
}

#[tokio::test]
async fn launch_failure_completes_once_without_output() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();

    let request = InvocationRequest::new("/nonexistent/runexe-test-binary")?.with_arg("x");
    let result = with_timeout(ProcessRunner::default().run(
        request,
        Arc::new(sink.clone()),
        CancellationToken::new(),
    ))
    .await;

    match result {
        Err(RunnerError::Launch { command, .. }) => {
            assert_eq!(command, "/nonexistent/runexe-test-binary")
        }
        other => panic!("expected launch error, got {other:?}"),
    }

    assert!(sink.publishes().is_empty());
    let status = sink.assert_completed_once();
    assert!(matches!(
        status.code,
        ExitCode::Abnormal(AbnormalReason::LaunchFailed(_))
    ));
    Ok(())
}

#[tokio::test]
async fn spawned_launch_failure_ends_terminated() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();

    let mut handle = ProcessRunner::default().spawn(
        InvocationRequest::new("/nonexistent/runexe-test-binary")?,
        Arc::new(sink.clone()),
    );
    let state = with_timeout(handle.wait_for_state(|s| *s == InvocationState::Terminated)).await;
    assert_eq!(state, InvocationState::Terminated);

    assert!(matches!(
        handle.join().await,
        Err(RunnerError::Launch { .. })
    ));
    sink.assert_completed_once();
    Ok(())
}

#[tokio::test]
async fn cancel_kills_running_process() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();

    let handle = ProcessRunner::default().spawn(
        sh("echo $$; exec sleep 30"),
        Arc::new(sink.clone()),
    );

    let out = sink.wait_for_output(|s| s.ends_with('\n')).await;
    let pid: u32 = out.trim().parse()?;

    let token = handle.cancel_token();
    let started = Instant::now();
    handle.cancel();
    let status = with_timeout(handle.join()).await?;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(status.code, ExitCode::Abnormal(AbnormalReason::Cancelled));
    assert_eq!(status.combined_output, out);
    assert!(token.is_cancelled());
    sink.assert_completed_once();
    assert_process_gone(pid).await;
    Ok(())
}

#[tokio::test]
async fn cancel_while_waiting_for_exit() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();

    // Output pipes are closed straight away, so the run moves on to waiting.
    let mut handle = ProcessRunner::default().spawn(
        sh("exec sleep 30 >/dev/null 2>&1"),
        Arc::new(sink.clone()),
    );
    let state = with_timeout(handle.wait_for_state(|s| *s == InvocationState::Waiting)).await;
    assert_eq!(state, InvocationState::Waiting);

    handle.cancel();
    let status = with_timeout(handle.join()).await?;

    assert_eq!(status.code, ExitCode::Abnormal(AbnormalReason::Cancelled));
    sink.assert_completed_once();
    Ok(())
}

#[tokio::test]
async fn cancelled_before_start_still_completes() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();
    let token = CancellationToken::new();
    token.cancel();

    let status = with_timeout(ProcessRunner::default().run(
        sh("exec sleep 30"),
        Arc::new(sink.clone()),
        token.clone(),
    ))
    .await?;

    assert_eq!(status.code, ExitCode::Abnormal(AbnormalReason::Cancelled));
    assert!(token.is_cancelled());
    sink.assert_completed_once();
    Ok(())
}

#[tokio::test]
async fn kill_after_stops_hung_process() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();
    let runner = ProcessRunner::new(RunnerConfig {
        kill_after: Some(Duration::from_millis(200)),
    });

    let started = Instant::now();
    let status = with_timeout(runner.run(
        sh("echo waiting; exec sleep 30"),
        Arc::new(sink.clone()),
        CancellationToken::new(),
    ))
    .await?;

    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(status.code, ExitCode::Abnormal(AbnormalReason::TimedOut));
    assert_eq!(status.combined_output, "waiting\n");
    sink.assert_completed_once();
    Ok(())
}

#[tokio::test]
async fn kill_after_does_not_affect_quick_processes() -> TestResult {
    init_tracing();
    let runner = ProcessRunner::new(RunnerConfig {
        kill_after: Some(Duration::from_secs(10)),
    });

    let status = with_timeout(runner.run(
        sh("echo quick"),
        Arc::new(RecordingSink::new()),
        CancellationToken::new(),
    ))
    .await?;

    assert!(status.success());
    Ok(())
}

#[tokio::test]
async fn dropping_the_run_future_interrupts_and_kills() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();
    let runner = ProcessRunner::default();

    let outcome = tokio::time::timeout(
        Duration::from_millis(300),
        runner.run(
            sh("echo $$; exec sleep 30"),
            Arc::new(sink.clone()),
            CancellationToken::new(),
        ),
    )
    .await;
    assert!(outcome.is_err(), "run should still have been in flight");

    let status = sink.assert_completed_once();
    assert_eq!(status.code, ExitCode::Abnormal(AbnormalReason::Interrupted));

    let pid: u32 = status.combined_output.trim().parse()?;
    assert_process_gone(pid).await;
    Ok(())
}
