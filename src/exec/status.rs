// src/exec/status.rs

//! Final result of an invocation.

use std::fmt;

/// Why an invocation did not end with an exit code reported by the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbnormalReason {
    /// The process could not be started.
    LaunchFailed(String),
    /// The process was killed by a signal (Unix).
    Signaled(i32),
    /// The invocation was cancelled through its [`CancellationToken`](super::CancellationToken).
    Cancelled,
    /// The configured `kill_after` deadline elapsed.
    TimedOut,
    /// Waiting for the process failed.
    WaitFailed(String),
    /// The run future was dropped before the process finished.
    Interrupted,
}

impl fmt::Display for AbnormalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbnormalReason::LaunchFailed(msg) => write!(f, "launch failed: {msg}"),
            AbnormalReason::Signaled(sig) => write!(f, "killed by signal {sig}"),
            AbnormalReason::Cancelled => write!(f, "cancelled"),
            AbnormalReason::TimedOut => write!(f, "timed out"),
            AbnormalReason::WaitFailed(msg) => write!(f, "wait failed: {msg}"),
            AbnormalReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Exit code reported by the process, or the abnormal marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitCode {
    Exited(i32),
    Abnormal(AbnormalReason),
}

impl From<std::process::ExitStatus> for ExitCode {
    fn from(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitCode::Exited(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitCode::Abnormal(AbnormalReason::Signaled(signal));
            }
        }

        ExitCode::Abnormal(AbnormalReason::WaitFailed(
            "process reported no exit code".to_string(),
        ))
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Exited(code) => write!(f, "{code}"),
            ExitCode::Abnormal(reason) => write!(f, "abnormal ({reason})"),
        }
    }
}

/// What an invocation produced: how it ended plus everything it printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitStatus {
    pub code: ExitCode,
    /// Merged stdout/stderr text, identical to the last published snapshot.
    pub combined_output: String,
}

impl ExitStatus {
    pub fn new(code: ExitCode, combined_output: String) -> Self {
        Self {
            code,
            combined_output,
        }
    }

    pub fn success(&self) -> bool {
        self.code == ExitCode::Exited(0)
    }

    pub fn is_abnormal(&self) -> bool {
        matches!(self.code, ExitCode::Abnormal(_))
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.code {
            ExitCode::Exited(code) => Some(code),
            ExitCode::Abnormal(_) => None,
        }
    }

    pub fn abnormal_reason(&self) -> Option<&AbnormalReason> {
        match &self.code {
            ExitCode::Abnormal(reason) => Some(reason),
            ExitCode::Exited(_) => None,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.code.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_only_for_zero() {
        assert!(ExitStatus::new(ExitCode::Exited(0), String::new()).success());
        assert!(!ExitStatus::new(ExitCode::Exited(3), String::new()).success());
        assert!(
            !ExitStatus::new(ExitCode::Abnormal(AbnormalReason::Cancelled), String::new())
                .success()
        );
    }

    #[test]
    fn abnormal_has_no_exit_code() {
        let status = ExitStatus::new(ExitCode::Abnormal(AbnormalReason::TimedOut), String::new());
        assert!(status.is_abnormal());
        assert_eq!(status.exit_code(), None);
        assert_eq!(status.abnormal_reason(), Some(&AbnormalReason::TimedOut));
        assert_eq!(status.to_string(), "abnormal (timed out)");
    }
}
