//! `Recorder`: execute-and-persist, replay-and-validate, or pass straight
//! through, chosen once at construction.
//!
//! A component that wants its side effects recorded routes each of them
//! through [`Recorder::next`]:
//!
//! ```
//! use recorder::errors::RecorderError;
//! use recorder::replay::recorder::Recorder;
//!
//! let mut sink = Vec::new();
//! let mut rec = Recorder::recording_to(&mut sink);
//! let out = rec.next("list testdata/*", || Ok::<_, RecorderError>("a\nb\n".to_string()))?;
//! assert_eq!(out, "a\nb\n");
//! drop(rec);
//!
//! let mut replay = Recorder::replaying_from(sink.as_slice(), "recording");
//! let out = replay.next("list testdata/*", || -> Result<String, RecorderError> {
//!     unreachable!("replay never runs the real thing")
//! })?;
//! assert_eq!(out, "a\nb\n");
//! # Ok::<(), RecorderError>(())
//! ```
//!
//! The sink or source is owned by the caller; the recorder only borrows it.

use crate::errors::RecorderError;
use crate::replay::grammar::{parse_recording, OperationParser};
use crate::replay::operation::Operation;
use crate::replay::scanner::LineScanner;
use crate::types::RecordMode;
use std::io::{BufRead, BufReader, Read, Write};

enum Backend<'a> {
    Disabled,
    Recording(Box<dyn Write + 'a>),
    Replaying(OperationParser<Box<dyn BufRead + 'a>>),
}

pub struct Recorder<'a> {
    backend: Backend<'a>,
}

impl<'a> Recorder<'a> {
    /// Passthrough: every `next` call just runs `produce`.
    pub fn disabled() -> Self {
        Self {
            backend: Backend::Disabled,
        }
    }

    pub fn recording_to(sink: impl Write + 'a) -> Self {
        Self {
            backend: Backend::Recording(Box::new(sink)),
        }
    }

    /// `name` is only used in diagnostics, typically the recording's path.
    pub fn replaying_from(source: impl Read + 'a, name: impl Into<String>) -> Self {
        let reader: Box<dyn BufRead + 'a> = Box::new(BufReader::new(source));
        Self {
            backend: Backend::Replaying(OperationParser::new(LineScanner::new(reader, name))),
        }
    }

    pub fn mode(&self) -> RecordMode {
        match self.backend {
            Backend::Disabled => RecordMode::Off,
            Backend::Recording(_) => RecordMode::Record,
            Backend::Replaying(_) => RecordMode::Replay,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.mode() == RecordMode::Record
    }

    pub fn is_replaying(&self) -> bool {
        self.mode() == RecordMode::Replay
    }

    /// Position of the last line read while replaying, `None` otherwise.
    pub fn position(&self) -> Option<String> {
        match &self.backend {
            Backend::Replaying(parser) => Some(parser.position()),
            _ => None,
        }
    }

    /// Run, record, or replay one unit of work identified by `command`.
    ///
    /// Errors from `produce` are returned as-is; recorder failures are
    /// converted through `E: From<RecorderError>`.
    pub fn next<F, E>(&mut self, command: &str, produce: F) -> Result<String, E>
    where
        F: FnOnce() -> Result<String, E>,
        E: From<RecorderError>,
    {
        let command = command.trim();
        match self.mode() {
            RecordMode::Off => produce(),
            RecordMode::Record => {
                let output = produce()?;
                self.record(&Operation::new(command, output.as_str()))?;
                Ok(output)
            }
            RecordMode::Replay => Ok(self.replay(command)?),
        }
    }

    fn replay(&mut self, command: &str) -> Result<String, RecorderError> {
        let Some(op) = self.step()? else {
            return Err(RecorderError::NotFound {
                command: command.to_string(),
                position: self.position().unwrap_or_default(),
            });
        };
        if op.command != command {
            return Err(RecorderError::Mismatch {
                position: self.position().unwrap_or_default(),
                recorded: op.command,
                requested: command.to_string(),
            });
        }
        Ok(op.output)
    }

    /// Append `op` to the sink. Only valid in record mode.
    pub fn record(&mut self, op: &Operation) -> Result<(), RecorderError> {
        let Backend::Recording(sink) = &mut self.backend else {
            return Err(RecorderError::Misconfigured(
                "not set to record".to_string(),
            ));
        };

        op.validate_command()?;
        let text = op.to_recording();
        check_reads_back(op, &text)?;

        sink.write_all(text.as_bytes())
            .map_err(|e| RecorderError::Io(e.to_string()))?;
        sink.flush().map_err(|e| RecorderError::Io(e.to_string()))
    }

    /// Pull the next recorded operation, `Ok(None)` at the end of the
    /// recording. Only valid in replay mode.
    pub fn step(&mut self) -> Result<Option<Operation>, RecorderError> {
        match &mut self.backend {
            Backend::Replaying(parser) => parser.next_operation(),
            Backend::Recording(_) => Err(RecorderError::Misconfigured(
                "set to record, not replay".to_string(),
            )),
            Backend::Disabled => Err(RecorderError::Misconfigured(
                "not set to replay".to_string(),
            )),
        }
    }

    /// Iterate over the remaining recorded operations. Iteration stops after
    /// the first error.
    pub fn operations(&mut self) -> Operations<'_, 'a> {
        Operations {
            recorder: self,
            finished: false,
        }
    }
}

/// The grammar cannot express every output (two consecutive `----` lines,
/// lines with a stray `\r`), so a recording is only written once it is known
/// to parse back to the same operation.
fn check_reads_back(op: &Operation, text: &str) -> Result<(), RecorderError> {
    let parsed = parse_recording(text, "<record>").map_err(|e| {
        RecorderError::Unrepresentable(format!("{:?} does not read back: {e}", op.command))
    })?;
    let expected = Operation {
        command: op.command.clone(),
        output: normalized_output(&op.output),
    };
    match parsed.as_slice() {
        [single] if *single == expected => Ok(()),
        _ => Err(RecorderError::Unrepresentable(format!(
            "output of {:?} does not read back unchanged",
            op.command
        ))),
    }
}

fn normalized_output(output: &str) -> String {
    if output.is_empty() || output.ends_with('\n') {
        output.to_string()
    } else {
        format!("{output}\n")
    }
}

pub struct Operations<'r, 'a> {
    recorder: &'r mut Recorder<'a>,
    finished: bool,
}

impl Iterator for Operations<'_, '_> {
    type Item = Result<Operation, RecorderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.recorder.step() {
            Ok(Some(op)) => Some(Ok(op)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}
