// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{Result, RunnerError};
use crate::exec::{InvocationRequest, RunnerConfig};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [runner]
/// kill_after = "30s"
///
/// [command.hello]
/// cmd = "/bin/echo"
/// args = ["hello", "world"]
///
/// [command.upload]
/// cmd = "/usr/local/bin/uploader"
/// arg_line = "--flag value"
/// stdin_file = "payload.bin"
/// ```
///
/// All sections are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub runner: RawRunnerSection,

    /// Named command presets from `[command.<name>]`.
    #[serde(default)]
    pub command: BTreeMap<String, RawCommandPreset>,
}

/// `[runner]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRunnerSection {
    /// Optional hung-process deadline, e.g. `"30s"`. Absent means never.
    #[serde(default)]
    pub kill_after: Option<String>,
}

/// `[command.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCommandPreset {
    /// Executable to run.
    pub cmd: String,

    /// Literal argument vector.
    #[serde(default)]
    pub args: Vec<String>,

    /// Whitespace-separated argument line; alternative to `args`.
    #[serde(default)]
    pub arg_line: Option<String>,

    /// File whose bytes are fed to the process input, relative to the config
    /// file's directory.
    #[serde(default)]
    pub stdin_file: Option<PathBuf>,
}

/// Validated configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub runner: RunnerConfig,
    pub command: BTreeMap<String, CommandPreset>,
    base_dir: PathBuf,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        runner: RunnerConfig,
        command: BTreeMap<String, CommandPreset>,
    ) -> Self {
        Self {
            runner,
            command,
            base_dir: PathBuf::new(),
        }
    }

    /// Directory relative paths in presets are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn preset(&self, name: &str) -> Result<&CommandPreset> {
        self.command.get(name).ok_or_else(|| {
            RunnerError::ConfigError(format!("unknown command preset '{}'", name))
        })
    }

    /// Build the request for preset `name`, reading its input file if any.
    pub fn request_for(&self, name: &str) -> Result<InvocationRequest> {
        self.preset(name)?.to_request(&self.base_dir)
    }
}

/// A validated `[command.<name>]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPreset {
    pub cmd: String,
    pub args: Vec<String>,
    pub stdin_file: Option<PathBuf>,
}

impl CommandPreset {
    /// Turn the preset into an [`InvocationRequest`].
    ///
    /// An unreadable `stdin_file` is an error; the request is never built with
    /// partial input.
    pub fn to_request(&self, base_dir: &Path) -> Result<InvocationRequest> {
        let mut request = InvocationRequest::new(&self.cmd)?.with_args(self.args.iter().cloned());

        if let Some(ref file) = self.stdin_file {
            let path = if file.is_absolute() {
                file.clone()
            } else {
                base_dir.join(file)
            };
            let bytes = std::fs::read(&path).map_err(|e| {
                RunnerError::ConfigError(format!(
                    "cannot read stdin_file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            request = request.with_stdin(bytes);
        }

        Ok(request)
    }
}
