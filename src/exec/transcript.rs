// src/exec/transcript.rs

//! Accumulated output of one invocation, bound to its sink.

use std::sync::Arc;

use tracing::debug;

use crate::exec::status::{AbnormalReason, ExitCode, ExitStatus};
use crate::sink::OutputSink;

/// Owns the combined output buffer and guarantees the sink sees exactly one
/// `complete` call.
///
/// If the transcript is dropped without [`Transcript::complete`] having been
/// called (the run future was dropped mid-flight), it completes the sink with
/// [`AbnormalReason::Interrupted`].
pub(crate) struct Transcript {
    sink: Arc<dyn OutputSink>,
    text: String,
    completed: bool,
}

impl Transcript {
    pub(crate) fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self {
            sink,
            text: String::new(),
            completed: false,
        }
    }

    /// Append a chunk of raw output and publish the new snapshot.
    pub(crate) fn append(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        self.text.push_str(&String::from_utf8_lossy(chunk));
        self.sink.publish(&self.text);
    }

    pub(crate) fn notice(&self, message: &str) {
        self.sink.notice(message);
    }

    pub(crate) fn complete(mut self, code: ExitCode) -> ExitStatus {
        self.completed = true;
        let status = ExitStatus::new(code, std::mem::take(&mut self.text));
        self.sink.complete(&status);
        status
    }
}

impl Drop for Transcript {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        debug!("invocation dropped before completion; completing sink as interrupted");
        let status = ExitStatus::new(
            ExitCode::Abnormal(AbnormalReason::Interrupted),
            std::mem::take(&mut self.text),
        );
        self.sink.complete(&status);
    }
}
