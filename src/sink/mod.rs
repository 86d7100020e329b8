// src/sink/mod.rs

//! Presentation boundary.
//!
//! The runner only talks to an [`OutputSink`]. How (and on which thread) the
//! text ends up on screen is the sink's business:
//!
//! - [`channel`] forwards sink calls over a Tokio channel so a rendering task
//!   can consume them at its own pace.
//! - [`console`] is such a rendering task, writing to a terminal.

pub mod channel;
pub mod console;

pub use channel::{ChannelSink, SinkEvent, SinkMessage};
pub use console::{Completion, ConsoleRenderer};

use crate::exec::ExitStatus;

/// Receiver of streamed output and the final status of an invocation.
///
/// Calls may arrive from any thread. For a single invocation:
/// - `publish` receives the cumulative output so far, each call strictly
///   longer than the previous one;
/// - `complete` is called exactly once, after every other call.
///
/// Implementations must not block for long; the runner does not wait on them
/// beyond the call itself.
pub trait OutputSink: Send + Sync {
    fn publish(&self, text: &str);

    /// Out-of-band note, e.g. that the input payload could not be written.
    fn notice(&self, _message: &str) {}

    fn complete(&self, status: &ExitStatus);
}
