// src/sink/channel.rs

//! Sink that hands every call over to another task.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc;
use tracing::debug;

use crate::exec::ExitStatus;
use crate::sink::OutputSink;

/// One sink call, as seen by the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// Output appended since the previous event for this sink.
    Appended(String),
    Notice(String),
    Completed(ExitStatus),
}

/// A [`SinkEvent`] tagged with the label of the sink that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkMessage {
    pub label: String,
    pub event: SinkEvent,
}

/// [`OutputSink`] that forwards calls over an unbounded channel.
///
/// Sending never blocks, so the runner is never held up by rendering. Only
/// the part of each snapshot not yet forwarded is sent, so the channel carries
/// every output byte once. Several sinks with different labels can share one
/// channel; the consumer tells their streams apart by label.
#[derive(Debug)]
pub struct ChannelSink {
    label: String,
    tx: mpsc::UnboundedSender<SinkMessage>,
    forwarded: AtomicUsize,
}

impl ChannelSink {
    pub fn new(label: impl Into<String>, tx: mpsc::UnboundedSender<SinkMessage>) -> Self {
        Self {
            label: label.into(),
            tx,
            forwarded: AtomicUsize::new(0),
        }
    }

    /// Create an unlabelled sink together with its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SinkMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(String::new(), tx), rx)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn forward(&self, event: SinkEvent) {
        let msg = SinkMessage {
            label: self.label.clone(),
            event,
        };
        if self.tx.send(msg).is_err() {
            debug!(label = %self.label, "sink receiver dropped; discarding event");
        }
    }
}

impl OutputSink for ChannelSink {
    fn publish(&self, text: &str) {
        let seen = self.forwarded.swap(text.len(), Ordering::AcqRel);
        // A shorter snapshot can only come from a new invocation reusing the sink.
        let start = if seen <= text.len() && text.is_char_boundary(seen) {
            seen
        } else {
            0
        };
        if start < text.len() {
            self.forward(SinkEvent::Appended(text[start..].to_string()));
        }
    }

    fn notice(&self, message: &str) {
        self.forward(SinkEvent::Notice(message.to_string()));
    }

    fn complete(&self, status: &ExitStatus) {
        self.forwarded.store(0, Ordering::Release);
        self.forward(SinkEvent::Completed(status.clone()));
    }
}
