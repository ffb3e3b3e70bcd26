//! Process execution routed through a `Recorder`.
//!
//! The recorded command is the rendered command line and the recorded output
//! is stdout. Replay never touches the inner runner, so a test can replay a
//! recording on a machine that does not have the program installed.

use crate::errors::RecorderError;
use crate::replay::recorder::Recorder;
use crate::runtime::{ProcessOutput, ProcessRequest, ProcessRunner};
use crate::types::RecordMode;

pub struct RecordedProcessRunner<'a> {
    recorder: Recorder<'a>,
    inner: &'a dyn ProcessRunner,
}

impl<'a> RecordedProcessRunner<'a> {
    pub fn new(recorder: Recorder<'a>, inner: &'a dyn ProcessRunner) -> Self {
        Self { recorder, inner }
    }

    pub fn mode(&self) -> RecordMode {
        self.recorder.mode()
    }

    /// Runs `request` for real unless replaying. A non-zero exit while
    /// running for real is an error and is never recorded.
    pub fn run(&mut self, request: &ProcessRequest) -> Result<ProcessOutput, RecorderError> {
        let inner = self.inner;
        let stdout = self.recorder.next(&request.command_line(), || {
            let output = inner.run(request)?;
            if output.exit_code != 0 {
                return Err(RecorderError::Process(format!(
                    "{} exited with {}: {}",
                    request.command_line(),
                    output.exit_code,
                    output.stderr.trim()
                )));
            }
            Ok(output.stdout)
        })?;
        Ok(ProcessOutput {
            exit_code: 0,
            stdout,
            stderr: String::new(),
        })
    }

    /// Convenience for line-oriented output, e.g. a file listing.
    pub fn run_lines(&mut self, request: &ProcessRequest) -> Result<Vec<String>, RecorderError> {
        let output = self.run(request)?;
        Ok(output.stdout.lines().map(str::to_string).collect())
    }

    pub fn into_recorder(self) -> Recorder<'a> {
        self.recorder
    }
}
