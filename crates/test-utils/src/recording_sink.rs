use std::sync::{Arc, Mutex};
use std::time::Duration;

use runexe::exec::ExitStatus;
use runexe::sink::OutputSink;

/// Everything a [`RecordingSink`] was told, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Publish(String),
    Notice(String),
    Complete(ExitStatus),
}

/// An `OutputSink` that records every call for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn publishes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Recorded::Publish(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Recorded::Notice(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> Vec<ExitStatus> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Recorded::Complete(status) => Some(status),
                _ => None,
            })
            .collect()
    }

    /// Latest published snapshot, or an empty string.
    pub fn latest(&self) -> String {
        self.publishes().pop().unwrap_or_default()
    }

    /// Poll until the latest snapshot satisfies `pred`; panics after 5 seconds.
    pub async fn wait_for_output(&self, pred: impl Fn(&str) -> bool) -> String {
        for _ in 0..500 {
            let latest = self.latest();
            if pred(&latest) {
                return latest;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected output never appeared; last snapshot: {:?}", self.latest());
    }

    /// Assert the sink saw exactly one completion, and that it came last.
    pub fn assert_completed_once(&self) -> ExitStatus {
        let calls = self.calls();
        let completions = self.completions();
        assert_eq!(completions.len(), 1, "expected one completion, got {calls:?}");
        assert!(
            matches!(calls.last(), Some(Recorded::Complete(_))),
            "completion was not the last call: {calls:?}"
        );
        completions[0].clone()
    }
}

impl OutputSink for RecordingSink {
    fn publish(&self, text: &str) {
        self.calls.lock().unwrap().push(Recorded::Publish(text.to_string()));
    }

    fn notice(&self, message: &str) {
        self.calls.lock().unwrap().push(Recorded::Notice(message.to_string()));
    }

    fn complete(&self, status: &ExitStatus) {
        self.calls.lock().unwrap().push(Recorded::Complete(status.clone()));
    }
}
