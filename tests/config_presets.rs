// tests/config_presets.rs

use std::error::Error;
use std::fs;
use std::time::Duration;

use tempfile::TempDir;

use runexe::config::load_and_validate;
use runexe::errors::RunnerError;
use runexe_test_utils::builders::{ConfigFileBuilder, PresetBuilder};

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("Runexe.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn presets_load_with_relative_stdin_file() -> TestResult {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("payload.bin"), b"GET / HTTP/1.1\r\n\r\n")?;
    let path = write_config(
        &dir,
        r#"
[runner]
kill_after = "30s"

[command.replay]
cmd = "/usr/local/bin/replayer"
arg_line = "--flag  value"
stdin_file = "payload.bin"

[command.hello]
cmd = "/bin/echo"
args = ["hello", "two words"]
"#,
    );

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.runner.kill_after, Some(Duration::from_secs(30)));
    assert_eq!(cfg.base_dir(), dir.path());

    let replay = cfg.request_for("replay")?;
    assert_eq!(replay.command(), "/usr/local/bin/replayer");
    assert_eq!(replay.args(), ["--flag", "value"]);
    assert_eq!(replay.stdin(), Some(&b"GET / HTTP/1.1\r\n\r\n"[..]));

    let hello = cfg.request_for("hello")?;
    assert_eq!(hello.args(), ["hello", "two words"]);
    assert!(hello.stdin().is_none());
    Ok(())
}

#[test]
fn unknown_preset_is_a_config_error() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .with_command("known", PresetBuilder::new("/bin/true").build())
        .build();

    match cfg.request_for("missing") {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("missing")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
    Ok(())
}

#[test]
fn unreadable_stdin_file_fails_before_running() -> TestResult {
    let dir = TempDir::new()?;
    let cfg = ConfigFileBuilder::new()
        .with_command(
            "broken",
            PresetBuilder::new("/bin/cat").stdin_file("does-not-exist.bin").build(),
        )
        .build()
        .with_base_dir(dir.path());

    match cfg.request_for("broken") {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("stdin_file")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
    Ok(())
}

#[test]
fn empty_cmd_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_command("blank", PresetBuilder::new("   ").build())
        .build_raw();

    match runexe::config::ConfigFile::try_from(raw) {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("blank")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn invalid_kill_after_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .kill_after("soon")
        .with_command("x", PresetBuilder::new("/bin/true").build())
        .build_raw();

    match runexe::config::ConfigFile::try_from(raw) {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("kill_after")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn config_file_without_commands_is_rejected() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "[runner]\nkill_after = \"5s\"\n");

    match load_and_validate(&path) {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("[command.<name>]")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
    Ok(())
}

#[test]
fn malformed_toml_is_a_toml_error() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "[command.x\ncmd = ");

    assert!(matches!(
        load_and_validate(&path),
        Err(RunnerError::TomlError(_))
    ));
    Ok(())
}
