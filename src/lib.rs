// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod sink;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::cli::{CliArgs, CliCommand};
use crate::config::{ConfigFile, load_optional, parse_duration};
use crate::exec::{CancellationToken, InvocationRequest, ProcessRunner, RunnerConfig};
use crate::sink::{ChannelSink, ConsoleRenderer, SinkMessage};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - turning CLI arguments / presets into invocation requests
/// - one runner task per invocation, each with its own sink
/// - console rendering
/// - Ctrl-C handling
///
/// Returns the exit code the process should exit with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_optional(args.config.as_deref())?;
    let runner_config = runner_config(&cfg, args.kill_after.as_deref())?;

    match args.command {
        CliCommand::List => {
            print_presets(&cfg);
            Ok(0)
        }
        CliCommand::Exec {
            stdin_file,
            command,
        } => {
            let (program, rest) = command
                .split_first()
                .ok_or_else(|| anyhow!("exec needs a command to run"))?;
            let mut request = InvocationRequest::new(program.as_str())?.with_args(rest.iter().cloned());
            if let Some(ref path) = stdin_file {
                request = request.with_stdin(read_input_file(path)?);
            }
            run_requests(ProcessRunner::new(runner_config), vec![(String::new(), request)]).await
        }
        CliCommand::Run { names } => {
            reject_duplicate_names(&names)?;
            let labelled = names.len() > 1;
            let mut requests = Vec::with_capacity(names.len());
            for name in names {
                let request = cfg.request_for(&name)?;
                let label = if labelled { name } else { String::new() };
                requests.push((label, request));
            }
            run_requests(ProcessRunner::new(runner_config), requests).await
        }
    }
}

/// Config-file runner settings, overridden by `--kill-after`.
fn runner_config(cfg: &ConfigFile, kill_after: Option<&str>) -> Result<RunnerConfig> {
    let mut runner = cfg.runner.clone();
    if let Some(s) = kill_after {
        let dur = parse_duration(s).map_err(|e| anyhow!("invalid --kill-after '{s}': {e}"))?;
        runner.kill_after = Some(dur);
    }
    Ok(runner)
}

/// Concurrent invocations are told apart by preset name, so each name may
/// appear only once.
fn reject_duplicate_names(names: &[String]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(anyhow!("preset '{name}' is named more than once"));
        }
    }
    Ok(())
}

fn read_input_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading stdin file {}", path.display()))
}

/// Run every request concurrently and render their output to stdout.
///
/// With a single request the exit code mirrors the process's own exit code;
/// with several, any failure yields 1.
async fn run_requests(
    runner: ProcessRunner,
    requests: Vec<(String, InvocationRequest)>,
) -> Result<i32> {
    let (tx, rx) = mpsc::unbounded_channel::<SinkMessage>();
    let renderer = tokio::spawn(ConsoleRenderer::new(std::io::stdout()).run(rx));

    let single = requests.len() == 1;
    let mut handles = Vec::with_capacity(requests.len());
    for (label, request) in requests {
        info!(label = %label, command = %request.command(), "submitting invocation");
        let sink = Arc::new(ChannelSink::new(label.clone(), tx.clone()));
        handles.push((label, runner.spawn(request, sink)));
    }
    drop(tx);

    // Ctrl-C → cancel every in-flight invocation.
    let tokens: Vec<CancellationToken> = handles.iter().map(|(_, h)| h.cancel_token()).collect();
    let ctrl_c = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        warn!("interrupt received; cancelling running processes");
        for token in &tokens {
            token.cancel();
        }
    });

    let mut exit_code = 0;
    for (label, handle) in handles {
        match handle.join().await {
            Ok(status) => {
                let code = status.exit_code().unwrap_or(1);
                if single {
                    exit_code = code;
                } else if code != 0 {
                    exit_code = 1;
                }
            }
            Err(e) => {
                error!(label = %label, error = %e, "invocation failed");
                exit_code = 1;
            }
        }
    }
    ctrl_c.abort();

    renderer
        .await
        .context("console renderer task failed")?
        .context("writing process output")?;

    Ok(exit_code)
}

/// Print configured presets without running them.
fn print_presets(cfg: &ConfigFile) {
    match cfg.runner.kill_after {
        Some(dur) => println!("runner.kill_after = {:?}", dur),
        None => println!("runner.kill_after = none"),
    }
    println!();

    println!("commands ({}):", cfg.command.len());
    for (name, preset) in cfg.command.iter() {
        println!("  - {name}");
        println!("      cmd: {}", preset.cmd);
        if !preset.args.is_empty() {
            println!("      args: {:?}", preset.args);
        }
        if let Some(ref file) = preset.stdin_file {
            println!("      stdin_file: {}", file.display());
        }
    }
}
