// src/config/validate.rs

use std::collections::BTreeMap;

use crate::config::duration::parse_duration;
use crate::config::model::{
    CommandPreset, ConfigFile, RawCommandPreset, RawConfigFile, RawRunnerSection,
};
use crate::errors::{Result, RunnerError};
use crate::exec::{RunnerConfig, split_arg_line};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RunnerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let runner = validate_runner_section(&raw.runner)?;
        let command = validate_presets(raw.command)?;
        if command.is_empty() {
            return Err(RunnerError::ConfigError(
                "config defines no commands; add at least one [command.<name>] section"
                    .to_string(),
            ));
        }
        Ok(ConfigFile::new_unchecked(runner, command))
    }
}

fn validate_runner_section(section: &RawRunnerSection) -> Result<RunnerConfig> {
    let kill_after = match section.kill_after {
        Some(ref s) => Some(parse_duration(s).map_err(|e| {
            RunnerError::ConfigError(format!("[runner].kill_after is invalid: {}", e))
        })?),
        None => None,
    };

    Ok(RunnerConfig { kill_after })
}

fn validate_presets(
    raw: BTreeMap<String, RawCommandPreset>,
) -> Result<BTreeMap<String, CommandPreset>> {
    let mut presets = BTreeMap::new();

    for (name, preset) in raw {
        let cmd = preset.cmd.trim();
        if cmd.is_empty() {
            return Err(RunnerError::ConfigError(format!(
                "command '{}' has an empty `cmd`",
                name
            )));
        }

        let args = match preset.arg_line {
            Some(ref line) if !preset.args.is_empty() => {
                return Err(RunnerError::ConfigError(format!(
                    "command '{}' sets both `args` and `arg_line` ({:?})",
                    name, line
                )));
            }
            Some(ref line) => split_arg_line(line),
            None => preset.args,
        };

        presets.insert(
            name,
            CommandPreset {
                cmd: cmd.to_string(),
                args,
                stdin_file: preset.stdin_file,
            },
        );
    }

    Ok(presets)
}
