// src/exec/request.rs

//! The immutable description of one process invocation.

use crate::errors::{Result, RunnerError};

/// What to run: executable, literal argument vector and optional input bytes.
///
/// A request is validated when it is built and consumed by value when it is
/// run, so one request produces exactly one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    command: String,
    args: Vec<String>,
    stdin: Option<Vec<u8>>,
}

impl InvocationRequest {
    /// Create a request for `command` with no arguments and no input.
    ///
    /// Surrounding whitespace is trimmed; an empty command is rejected.
    pub fn new(command: impl Into<String>) -> Result<Self> {
        let command = command.into();
        let trimmed = command.trim();
        if trimmed.is_empty() {
            return Err(RunnerError::InvalidRequest(
                "command path is required".to_string(),
            ));
        }

        Ok(Self {
            command: trimmed.to_string(),
            args: Vec::new(),
            stdin: None,
        })
    }

    /// Build a request from a command and a whitespace-separated argument line.
    pub fn from_command_line(command: impl Into<String>, arg_line: &str) -> Result<Self> {
        Ok(Self::new(command)?.with_args(split_arg_line(arg_line)))
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Bytes written to the process input before it is closed.
    pub fn with_stdin(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(bytes.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn stdin(&self) -> Option<&[u8]> {
        self.stdin.as_deref()
    }

    pub(crate) fn into_parts(self) -> (String, Vec<String>, Option<Vec<u8>>) {
        (self.command, self.args, self.stdin)
    }
}

/// Split an argument line on runs of whitespace.
///
/// No quoting or escaping is interpreted; an empty line yields no arguments.
pub fn split_arg_line(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}
