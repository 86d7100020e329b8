#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use runexe::config::{ConfigFile, RawCommandPreset, RawConfigFile, RawRunnerSection};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                runner: RawRunnerSection::default(),
                command: BTreeMap::new(),
            },
        }
    }

    pub fn with_command(mut self, name: &str, preset: RawCommandPreset) -> Self {
        self.config.command.insert(name.to_string(), preset);
        self
    }

    pub fn kill_after(mut self, duration: &str) -> Self {
        self.config.runner.kill_after = Some(duration.to_string());
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RawCommandPreset`.
pub struct PresetBuilder {
    preset: RawCommandPreset,
}

impl PresetBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            preset: RawCommandPreset {
                cmd: cmd.to_string(),
                args: vec![],
                arg_line: None,
                stdin_file: None,
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.preset.args.push(arg.to_string());
        self
    }

    pub fn arg_line(mut self, line: &str) -> Self {
        self.preset.arg_line = Some(line.to_string());
        self
    }

    pub fn stdin_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.preset.stdin_file = Some(path.into());
        self
    }

    pub fn build(self) -> RawCommandPreset {
        self.preset
    }
}
