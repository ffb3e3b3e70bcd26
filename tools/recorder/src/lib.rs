pub mod config;
pub mod errors;
pub mod log_retention;
pub mod logging;
pub mod process;
pub mod replay;
pub mod runtime;
pub mod types;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use config::{load_config, AppConfig, CliOverrides};
use errors::RecorderError;
use logging::{structured_fallback_line, JsonlLogger};
use process::RecordedProcessRunner;
use replay::{parse_recording, Operation, Recorder};
use runtime::{ProcessRequest, ProductionRuntime};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use types::RecordMode;

#[derive(Debug, Clone, Parser)]
#[command(name = "recorder")]
#[command(about = "Record command output to a text file and replay it in place of the real thing")]
pub struct Cli {
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Recording file; replayed from unless --record is given
    #[arg(long, global = true)]
    pub recording: Option<PathBuf>,
    /// Ignore the existing recording and rewrite it from a real execution
    #[arg(long, global = true, default_value_t = false)]
    pub record: bool,
    /// Append JSONL events to this file
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Run one command, recording or replaying it
    Exec {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        argv: Vec<String>,
    },
    /// Check that every operation in a recording reads back unchanged
    Verify { path: PathBuf },
    /// Print every operation in a recording
    Dump {
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

pub fn run() -> Result<i32, RecorderError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let cwd = std::env::current_dir().map_err(|e| RecorderError::Io(e.to_string()))?;
    let runtime = ProductionRuntime::new();
    run_with_runtime(&args, &cwd, &runtime)
}

pub fn run_with_runtime(
    args: &[std::ffi::OsString],
    cwd: &Path,
    runtime: &ProductionRuntime,
) -> Result<i32, RecorderError> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                runtime.terminal.write_raw(&error.to_string())?;
                return Ok(0);
            }
            _ => return Err(RecorderError::Cli(error.to_string())),
        },
    };

    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        recording_path: cli.recording.clone(),
        record: cli.record,
        log_path: cli.log.clone(),
    };
    let cfg = load_config(&overrides, cwd, runtime.file_system.as_ref())?;
    let logger = JsonlLogger::from_config(&cfg.logging);

    let result = match &cli.command {
        CliCommand::Exec { argv } => run_exec(runtime, &cfg, argv, logger.as_ref()),
        CliCommand::Verify { path } => run_verify(runtime, &cwd.join(path), logger.as_ref()),
        CliCommand::Dump { path, json } => run_dump(runtime, &cwd.join(path), *json),
    };

    if let (Err(err), Some(logger)) = (&result, logger.as_ref()) {
        let _ = logger.error("failure", json!({ "error": err.to_string() }));
    }
    result.map(|()| 0)
}

fn run_exec(
    runtime: &ProductionRuntime,
    cfg: &AppConfig,
    argv: &[String],
    logger: Option<&JsonlLogger>,
) -> Result<(), RecorderError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(RecorderError::Cli("exec needs a program to run".to_string()));
    };
    let request = ProcessRequest::new(program.as_str(), args.iter().map(String::as_str));
    let mode = cfg.effective_mode();
    let fs = runtime.file_system.as_ref();

    let replay_source;
    let mut sink = Vec::new();
    let recorder = match (mode, cfg.recording.path.as_deref()) {
        (RecordMode::Record, Some(_)) => Recorder::recording_to(&mut sink),
        (RecordMode::Replay, Some(path)) => {
            replay_source = fs.read_to_string(path)?;
            Recorder::replaying_from(replay_source.as_bytes(), cfg.recording_name())
        }
        _ => Recorder::disabled(),
    };

    let mut runner = RecordedProcessRunner::new(recorder, runtime.process_runner.as_ref());
    let output = runner.run(&request)?;
    drop(runner);

    if let (RecordMode::Record, Some(path)) = (mode, cfg.recording.path.as_deref()) {
        if let Some(parent) = path.parent() {
            fs.create_dir_all(parent)?;
        }
        let text = String::from_utf8(sink).map_err(|e| RecorderError::Io(e.to_string()))?;
        fs.write_string(path, &text)?;
    }

    runtime.terminal.write_raw(&output.stdout)?;
    if let Some(logger) = logger {
        logger.info(
            "exec",
            json!({
                "mode": mode.as_str(),
                "command": request.command_line(),
                "stdout_bytes": output.stdout.len(),
            }),
        )?;
    }
    Ok(())
}

fn run_verify(
    runtime: &ProductionRuntime,
    path: &Path,
    logger: Option<&JsonlLogger>,
) -> Result<(), RecorderError> {
    let text = runtime.file_system.read_to_string(path)?;
    let name = path.display().to_string();
    let mut recorder = Recorder::replaying_from(text.as_bytes(), name.as_str());

    let mut hasher = Sha256::new();
    let mut count = 0usize;
    for op in recorder.operations() {
        let op = op?;
        count += 1;
        let canonical = check_round_trip(&op, &name, count)?;
        hasher.update(canonical.as_bytes());
    }
    let digest = hex_bytes(&hasher.finalize());

    let summary = format!("verified: operations={count} digest={digest}");
    if runtime.terminal.stdin_is_tty() {
        runtime.terminal.write_line(&summary)?;
    } else {
        runtime
            .terminal
            .write_line(&structured_fallback_line("replay", "verify", &summary))?;
    }
    if let Some(logger) = logger {
        logger.info(
            "verify",
            json!({ "recording": name, "operations": count, "digest": digest }),
        )?;
    }
    Ok(())
}

/// Serialize, re-parse and re-serialize one operation; returns the canonical
/// text when both the operation and its text survive unchanged.
fn check_round_trip(op: &Operation, name: &str, index: usize) -> Result<String, RecorderError> {
    let canonical = op.to_recording();
    let reparsed = parse_recording(&canonical, "<verify>")?;
    let stable = match reparsed.as_slice() {
        [single] => single == op && single.to_recording() == canonical,
        _ => false,
    };
    if !stable {
        return Err(RecorderError::grammar(
            format!("{name}#{index}"),
            format!("operation {:?} does not round-trip", op.command),
        ));
    }
    Ok(canonical)
}

fn run_dump(runtime: &ProductionRuntime, path: &Path, as_json: bool) -> Result<(), RecorderError> {
    let text = runtime.file_system.read_to_string(path)?;
    let mut recorder = Recorder::replaying_from(text.as_bytes(), path.display().to_string());
    for op in recorder.operations() {
        let op = op?;
        if as_json {
            let line = serde_json::to_string(&op).map_err(|e| RecorderError::Io(e.to_string()))?;
            runtime.terminal.write_line(&line)?;
        } else {
            runtime.terminal.write_raw(&op.to_recording())?;
        }
    }
    Ok(())
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub fn render_help() -> String {
    Cli::command().render_long_help().to_string()
}
