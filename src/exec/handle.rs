// src/exec/handle.rs

//! OS process plus the tasks that own its pipes.

#[cfg(unix)]
use std::os::fd::OwnedFd;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
#[cfg(unix)]
use tokio::net::unix::pipe;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::exec::status::AbnormalReason;

/// Events produced by the I/O tasks attached to a process.
#[derive(Debug)]
pub(crate) enum StreamEvent {
    /// One line of output, including its trailing newline if any.
    Output(Vec<u8>),
    /// The whole input payload was written and stdin closed.
    InputClosed,
    /// Writing the input payload failed.
    InputFailed(String),
}

/// A spawned process exclusively owned by one invocation.
///
/// stdout and stderr share a single pipe, so lines arrive in the order the
/// process wrote them, and one reader task turns it into `Output` events. The
/// input payload (if any) is written by a writer task. Both report into the
/// same channel, which closes once every task has finished.
///
/// Dropping the handle aborts the I/O tasks and kills the process if it is
/// still alive. Prefer [`ProcessHandle::release`] on normal paths, which also
/// waits for the aborted tasks and reaps the process.
pub(crate) struct ProcessHandle {
    child: Child,
    pid: Option<u32>,
    io_tasks: Vec<JoinHandle<()>>,
}

impl ProcessHandle {
    /// Spawn `command` with `args`, wiring its pipes to `events`.
    ///
    /// Without an input payload stdin is `/dev/null` and no `InputClosed`
    /// event is sent.
    pub(crate) fn spawn(
        command: &str,
        args: &[String],
        stdin: Option<Vec<u8>>,
        events: mpsc::Sender<StreamEvent>,
    ) -> std::io::Result<Self> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        #[cfg(unix)]
        let output = merged_output(&mut cmd)?;
        #[cfg(not(unix))]
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd.spawn()?;
        // The command still owns the parent's copies of the output write end;
        // the reader only sees EOF once they are closed.
        drop(cmd);
        let pid = child.id();
        info!(command, ?args, pid, "process started");

        let mut io_tasks = Vec::with_capacity(3);

        #[cfg(unix)]
        io_tasks.push(spawn_reader("output", output, pid, events.clone()));
        #[cfg(not(unix))]
        {
            // Separate pipes here; lines of the two streams may interleave
            // out of write order.
            if let Some(stdout) = child.stdout.take() {
                io_tasks.push(spawn_reader("stdout", stdout, pid, events.clone()));
            }
            if let Some(stderr) = child.stderr.take() {
                io_tasks.push(spawn_reader("stderr", stderr, pid, events.clone()));
            }
        }

        if let (Some(payload), Some(pipe)) = (stdin, child.stdin.take()) {
            io_tasks.push(spawn_writer(pipe, payload, pid, events));
        }

        Ok(Self {
            child,
            pid,
            io_tasks,
        })
    }

    pub(crate) fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub(crate) async fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
        self.child.wait().await
    }

    /// Forcibly stop the process if it is still running, and reap it.
    pub(crate) async fn terminate(&mut self, reason: &AbnormalReason) {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = self.pid, ?status, "process already exited; nothing to terminate");
            }
            _ => {
                info!(pid = self.pid, %reason, "killing process");
                if let Err(e) = self.child.kill().await {
                    warn!(pid = self.pid, error = %e, "failed to kill process");
                }
            }
        }
    }

    /// Close every pipe and make sure the process is gone.
    pub(crate) async fn release(&mut self) {
        for task in self.io_tasks.drain(..) {
            task.abort();
            let _ = task.await;
        }

        if let Ok(None) = self.child.try_wait() {
            debug!(pid = self.pid, "process still alive at release; killing");
            if let Err(e) = self.child.kill().await {
                warn!(pid = self.pid, error = %e, "failed to kill process at release");
            }
        }

        debug!(pid = self.pid, "process handle released");
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        for task in &self.io_tasks {
            task.abort();
        }

        if let Ok(None) = self.child.try_wait() {
            debug!(pid = self.pid, "process handle dropped while process alive; killing");
            let _ = self.child.start_kill();
        }
    }
}

/// Point both stdout and stderr of `cmd` at one pipe and return its read end.
#[cfg(unix)]
fn merged_output(cmd: &mut Command) -> std::io::Result<pipe::Receiver> {
    let (reader, writer) = std::io::pipe()?;
    cmd.stdout(writer.try_clone()?).stderr(writer);
    pipe::Receiver::from_owned_fd(OwnedFd::from(reader))
}

fn spawn_reader<R>(
    stream: &'static str,
    pipe: R,
    pid: Option<u32>,
    events: mpsc::Sender<StreamEvent>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut line = Vec::new();

        loop {
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    let chunk = std::mem::take(&mut line);
                    if events.send(StreamEvent::Output(chunk)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    // Read errors end the stream like EOF would.
                    debug!(pid, stream, error = %e, "read failed; treating as end of output");
                    break;
                }
            }
        }

        debug!(pid, stream, "output reader ended");
    })
}

fn spawn_writer(
    mut pipe: ChildStdin,
    payload: Vec<u8>,
    pid: Option<u32>,
    events: mpsc::Sender<StreamEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result: std::io::Result<()> = async {
            pipe.write_all(&payload).await?;
            pipe.flush().await?;
            pipe.shutdown().await
        }
        .await;
        drop(pipe);

        let event = match result {
            Ok(()) => {
                debug!(pid, bytes = payload.len(), "input written and closed");
                StreamEvent::InputClosed
            }
            Err(e) => StreamEvent::InputFailed(e.to_string()),
        };
        let _ = events.send(event).await;
    })
}
