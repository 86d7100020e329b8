// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `runexe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runexe",
    version,
    about = "Run external programs and stream their output as it is produced.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Runexe.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNEXE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Kill processes still running after this long (e.g. "30s", "500ms").
    ///
    /// Overrides `[runner].kill_after`. Without either, processes may run forever.
    #[arg(long, value_name = "DURATION")]
    pub kill_after: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Run a single command line.
    Exec {
        /// Feed the contents of this file to the process input.
        #[arg(long, value_name = "PATH")]
        stdin_file: Option<PathBuf>,

        /// Executable followed by its arguments.
        #[arg(
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "CMD"
        )]
        command: Vec<String>,
    },

    /// Run one or more configured presets concurrently.
    Run {
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },

    /// List configured presets without running anything.
    List,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
