// src/sink/console.rs

//! Terminal rendering of [`SinkMessage`]s.

use std::io::Write;

use tokio::sync::mpsc;

use crate::exec::{ExitCode, ExitStatus};
use crate::sink::channel::{SinkEvent, SinkMessage};

/// Final status of one labelled invocation, as seen by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub label: String,
    pub status: ExitStatus,
}

/// Writes streamed output to a terminal (or any writer).
///
/// Appended output is written one line at a time, prefixed with `[label] `
/// when the label is non-empty.
pub struct ConsoleRenderer<W: Write> {
    out: W,
    completions: Vec<Completion>,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            completions: Vec::new(),
        }
    }

    /// Consume messages until every sender is gone.
    pub async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<SinkMessage>,
    ) -> std::io::Result<Vec<Completion>> {
        while let Some(msg) = rx.recv().await {
            self.handle(msg)?;
        }
        self.out.flush()?;
        Ok(self.completions)
    }

    pub fn handle(&mut self, msg: SinkMessage) -> std::io::Result<()> {
        let SinkMessage { label, event } = msg;
        match event {
            SinkEvent::Appended(text) => {
                for line in text.split_inclusive('\n') {
                    write!(self.out, "{}{line}", prefix(&label))?;
                }
                self.out.flush()?;
            }
            SinkEvent::Notice(message) => {
                writeln!(self.out, "{}note: {message}", prefix(&label))?;
            }
            SinkEvent::Completed(status) => {
                let output = &status.combined_output;
                if !output.is_empty() && !output.ends_with('\n') {
                    writeln!(self.out)?;
                }
                writeln!(self.out, "{}{}", prefix(&label), trailer(&status))?;
                self.out.flush()?;
                self.completions.push(Completion { label, status });
            }
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn prefix(label: &str) -> String {
    if label.is_empty() {
        String::new()
    } else {
        format!("[{label}] ")
    }
}

fn trailer(status: &ExitStatus) -> String {
    match &status.code {
        ExitCode::Exited(code) => format!("--- Process exited with code: {code} ---"),
        ExitCode::Abnormal(reason) => format!("--- Process ended abnormally: {reason} ---"),
    }
}
