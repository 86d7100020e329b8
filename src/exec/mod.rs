// src/exec/mod.rs

//! Process execution layer.
//!
//! Everything needed to run one external program to completion with
//! `tokio::process::Command`, streaming its output into an
//! [`OutputSink`](crate::sink::OutputSink):
//!
//! - [`request`] holds the immutable [`InvocationRequest`].
//! - [`runner`] owns the spawn / stream / wait / cleanup protocol
//!   ([`ProcessRunner`]) and the per-invocation [`RunHandle`].
//! - [`handle`] wraps the OS process and the tasks that own its pipes.
//! - [`transcript`] accumulates output and guarantees a single completion.
//! - [`status`] defines the final [`ExitStatus`].
//!
//! Invocations are stopped from outside with a [`CancellationToken`].

mod handle;
pub mod request;
pub mod runner;
pub mod status;
mod transcript;

pub use tokio_util::sync::CancellationToken;
pub use request::{InvocationRequest, split_arg_line};
pub use runner::{InvocationState, ProcessRunner, RunHandle, RunnerConfig};
pub use status::{AbnormalReason, ExitCode, ExitStatus};
