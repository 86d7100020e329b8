// src/exec/runner.rs

//! The spawn / stream / wait / cleanup protocol for one invocation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::{Result, RunnerError};
use crate::exec::handle::{ProcessHandle, StreamEvent};
use crate::exec::request::InvocationRequest;
use crate::exec::status::{AbnormalReason, ExitCode, ExitStatus};
use crate::exec::transcript::Transcript;
use crate::sink::OutputSink;

/// Capacity of the channel between the I/O tasks and the run loop.
const STREAM_BUFFER: usize = 64;

/// Lifecycle of one invocation.
///
/// `Pending → Spawning → Running → Draining → Waiting → Terminated`, with
/// `Spawning → Terminated` on launch failure and any state → `Terminated` on
/// cancellation, deadline or interruption.
///
/// `Running` lasts while the input payload is still being written; output is
/// already streamed in this state. `Draining` starts once stdin is closed (at
/// once when there is no input) and ends when the output stream does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Pending,
    Spawning,
    Running,
    Draining,
    Waiting,
    Terminated,
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvocationState::Pending => "pending",
            InvocationState::Spawning => "spawning",
            InvocationState::Running => "running",
            InvocationState::Draining => "draining",
            InvocationState::Waiting => "waiting",
            InvocationState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Runner-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Kill the process once it has been running this long.
    ///
    /// `None` (the default) means the runner never gives up on its own: a
    /// process that never exits, or blocks on input it never gets, keeps the
    /// invocation alive until it is cancelled.
    pub kill_after: Option<Duration>,
}

/// Executes [`InvocationRequest`]s.
///
/// The runner itself holds no per-invocation state; every call gets its own
/// process, pipes and transcript, so one runner can serve any number of
/// concurrent invocations.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    config: RunnerConfig,
}

impl ProcessRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run `request` to completion, streaming output into `sink`.
    ///
    /// `sink.complete` is called exactly once whatever happens. The only
    /// error returned is [`RunnerError::Launch`]; every other failure shows up
    /// as an abnormal [`ExitStatus`].
    pub async fn run(
        &self,
        request: InvocationRequest,
        sink: Arc<dyn OutputSink>,
        cancel: CancellationToken,
    ) -> Result<ExitStatus> {
        let (state_tx, _state_rx) = watch::channel(InvocationState::Pending);
        self.execute(request, sink, cancel, state_tx).await
    }

    /// Run `request` on its own Tokio task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(&self, request: InvocationRequest, sink: Arc<dyn OutputSink>) -> RunHandle {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(InvocationState::Pending);

        let runner = self.clone();
        let token = cancel.clone();
        let task =
            tokio::spawn(async move { runner.execute(request, sink, token, state_tx).await });

        RunHandle {
            cancel,
            state: state_rx,
            task,
        }
    }

    async fn execute(
        &self,
        request: InvocationRequest,
        sink: Arc<dyn OutputSink>,
        cancel: CancellationToken,
        state: watch::Sender<InvocationState>,
    ) -> Result<ExitStatus> {
        let (command, args, stdin) = request.into_parts();
        let has_input = stdin.is_some();
        let mut transcript = Transcript::new(sink);

        enter(&state, &command, InvocationState::Spawning);
        let (events_tx, mut events) = mpsc::channel::<StreamEvent>(STREAM_BUFFER);

        let mut handle = match ProcessHandle::spawn(&command, &args, stdin, events_tx) {
            Ok(handle) => handle,
            Err(source) => {
                error!(command = %command, error = %source, "failed to launch process");
                transcript.complete(ExitCode::Abnormal(AbnormalReason::LaunchFailed(
                    source.to_string(),
                )));
                enter(&state, &command, InvocationState::Terminated);
                return Err(RunnerError::Launch { command, source });
            }
        };
        let pid = handle.pid();
        enter(&state, &command, InvocationState::Running);
        if !has_input {
            enter(&state, &command, InvocationState::Draining);
        }

        let deadline = self.config.kill_after.map(|after| Instant::now() + after);
        let expired = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expired);
        let cancelled = cancel.cancelled();
        tokio::pin!(cancelled);

        let stopped = loop {
            tokio::select! {
                biased;
                _ = &mut cancelled => break Some(AbnormalReason::Cancelled),
                _ = &mut expired => break Some(AbnormalReason::TimedOut),
                event = events.recv() => match event {
                    Some(StreamEvent::Output(chunk)) => transcript.append(&chunk),
                    Some(StreamEvent::InputClosed) => {
                        enter(&state, &command, InvocationState::Draining);
                    }
                    Some(StreamEvent::InputFailed(msg)) => {
                        warn!(command = %command, pid, error = %msg, "failed to write process input");
                        transcript.notice(&format!("failed to write process input: {msg}"));
                        enter(&state, &command, InvocationState::Draining);
                    }
                    None => break None,
                },
            }
        };

        let code = match stopped {
            Some(reason) => {
                handle.terminate(&reason).await;
                ExitCode::Abnormal(reason)
            }
            None => {
                enter(&state, &command, InvocationState::Waiting);
                let outcome = tokio::select! {
                    biased;
                    _ = &mut cancelled => Err(AbnormalReason::Cancelled),
                    _ = &mut expired => Err(AbnormalReason::TimedOut),
                    res = handle.wait() => Ok(res),
                };

                match outcome {
                    Ok(Ok(status)) => ExitCode::from(status),
                    Ok(Err(e)) => {
                        warn!(command = %command, pid, error = %e, "waiting for process failed");
                        ExitCode::Abnormal(AbnormalReason::WaitFailed(e.to_string()))
                    }
                    Err(reason) => {
                        handle.terminate(&reason).await;
                        ExitCode::Abnormal(reason)
                    }
                }
            }
        };

        handle.release().await;
        drop(events);
        enter(&state, &command, InvocationState::Terminated);

        info!(command = %command, pid, exit_code = %code, "process finished");
        Ok(transcript.complete(code))
    }
}

fn enter(state: &watch::Sender<InvocationState>, command: &str, next: InvocationState) {
    let prev = state.send_replace(next);
    debug!(command, from = %prev, to = %next, "invocation state changed");
}

/// Handle to an invocation running on its own task.
#[derive(Debug)]
pub struct RunHandle {
    cancel: CancellationToken,
    state: watch::Receiver<InvocationState>,
    task: JoinHandle<Result<ExitStatus>>,
}

impl RunHandle {
    /// Request cancellation; the process is killed and the sink completed
    /// with [`AbnormalReason::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> InvocationState {
        *self.state.borrow()
    }

    /// Wait until the invocation reaches a state matching `pred`.
    ///
    /// Returns the current state if the invocation task has already gone away.
    pub async fn wait_for_state(
        &mut self,
        pred: impl FnMut(&InvocationState) -> bool,
    ) -> InvocationState {
        let reached = match self.state.wait_for(pred).await {
            Ok(state) => Some(*state),
            Err(_) => None,
        };
        reached.unwrap_or_else(|| *self.state.borrow())
    }

    /// Wait for the invocation to finish.
    pub async fn join(self) -> Result<ExitStatus> {
        self.task.await.map_err(anyhow::Error::from)?
    }
}
