//! State machine that pulls one `Operation` at a time out of a `LineScanner`.
//!
//! See `operation.rs` for the grammar. The one subtle rule: inside an escaped
//! output block a single `----` line is output, only two consecutive ones
//! close the block, and the line after the closing pair must be blank (or the
//! end of input).

use crate::errors::RecorderError;
use crate::replay::operation::{Operation, COMMENT_PREFIX, CONTINUATION, SEPARATOR};
use crate::replay::scanner::LineScanner;
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    SeekCommand,
    ExpectSeparator,
    ReadOutput,
    Done,
    Error,
}

pub fn validate_transition(from: ParseState, to: ParseState) -> Result<(), RecorderError> {
    use ParseState as S;

    let allowed = match from {
        S::SeekCommand => matches!(to, S::ExpectSeparator | S::Error),
        S::ExpectSeparator => matches!(to, S::ReadOutput | S::Error),
        S::ReadOutput => matches!(to, S::Done | S::Error),
        S::Done => matches!(to, S::SeekCommand),
        S::Error => false,
    };

    if !allowed {
        return Err(RecorderError::Misconfigured(format!(
            "illegal parser transition: {from:?} -> {to:?}"
        )));
    }
    Ok(())
}

fn is_separator(line: &str) -> bool {
    line == SEPARATOR
}

fn push_line(output: &mut String, line: &str) {
    output.push_str(line);
    output.push('\n');
}

pub struct OperationParser<R> {
    scanner: LineScanner<R>,
    state: ParseState,
}

impl<R: BufRead> OperationParser<R> {
    pub fn new(scanner: LineScanner<R>) -> Self {
        Self {
            scanner,
            state: ParseState::SeekCommand,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn position(&self) -> String {
        self.scanner.position()
    }

    pub fn source_name(&self) -> &str {
        self.scanner.name()
    }

    /// Parse the next operation. `Ok(None)` is the normal end of input. Any
    /// error leaves the parser in `ParseState::Error`, and every later call
    /// fails with `RecorderError::Halted`.
    pub fn next_operation(&mut self) -> Result<Option<Operation>, RecorderError> {
        match self.state {
            ParseState::Error => {
                return Err(RecorderError::Halted {
                    position: self.scanner.position(),
                })
            }
            ParseState::Done => self.transition(ParseState::SeekCommand)?,
            _ => {}
        }

        match self.parse() {
            Ok(op) => Ok(op),
            Err(err) => {
                self.state = ParseState::Error;
                Err(err)
            }
        }
    }

    fn transition(&mut self, next: ParseState) -> Result<(), RecorderError> {
        validate_transition(self.state, next)?;
        self.state = next;
        Ok(())
    }

    fn parse(&mut self) -> Result<Option<Operation>, RecorderError> {
        let Some(command) = self.seek_command()? else {
            return Ok(None);
        };

        self.transition(ParseState::ExpectSeparator)?;
        self.expect_separator()?;

        self.transition(ParseState::ReadOutput)?;
        let output = self.read_output()?;

        self.transition(ParseState::Done)?;
        Ok(Some(Operation { command, output }))
    }

    fn seek_command(&mut self) -> Result<Option<String>, RecorderError> {
        while self.scanner.scan()? {
            let mut line = self.scanner.text().trim().to_string();
            if line.starts_with(COMMENT_PREFIX) {
                continue;
            }

            while line.ends_with(CONTINUATION) && self.scanner.scan()? {
                let head = line.strip_suffix(CONTINUATION).unwrap_or(&line).trim();
                line = format!("{head} {}", self.scanner.text().trim());
            }

            let command = line.trim();
            if command.is_empty() {
                continue;
            }
            return Ok(Some(command.to_string()));
        }
        Ok(None)
    }

    fn expect_separator(&mut self) -> Result<(), RecorderError> {
        if !self.scanner.scan()? {
            return Err(RecorderError::grammar(
                self.scanner.position(),
                format!("expected to find separator {SEPARATOR:?} after command, found end of input"),
            ));
        }
        let line = self.scanner.text();
        if !is_separator(line) {
            return Err(RecorderError::grammar(
                self.scanner.position(),
                format!("expected to find separator {SEPARATOR:?} after command, found {line:?} instead"),
            ));
        }
        Ok(())
    }

    fn read_output(&mut self) -> Result<String, RecorderError> {
        if !self.scanner.scan()? {
            return Ok(String::new());
        }
        if is_separator(self.scanner.text()) {
            return self.read_escaped_output();
        }
        self.read_plain_output()
    }

    /// Starts from the line already under the scanner.
    fn read_plain_output(&mut self) -> Result<String, RecorderError> {
        let mut output = String::new();
        loop {
            let line = self.scanner.text();
            if line.trim().is_empty() {
                break;
            }
            push_line(&mut output, line);
            if !self.scanner.scan()? {
                break;
            }
        }
        Ok(output)
    }

    fn read_escaped_output(&mut self) -> Result<String, RecorderError> {
        let opened_at = self.scanner.position();
        let mut output = String::new();

        while self.scanner.scan()? {
            if !is_separator(self.scanner.text()) {
                push_line(&mut output, self.scanner.text());
                continue;
            }

            if !self.scanner.scan()? {
                break;
            }
            if is_separator(self.scanner.text()) {
                self.expect_blank_trailer()?;
                return Ok(output);
            }

            // A lone separator is output; keep it and the line after it.
            push_line(&mut output, SEPARATOR);
            push_line(&mut output, self.scanner.text());
        }

        Err(RecorderError::grammar(
            self.scanner.position(),
            format!("missing closing separators for output block opened at {opened_at}"),
        ))
    }

    fn expect_blank_trailer(&mut self) -> Result<(), RecorderError> {
        if self.scanner.scan()? && !self.scanner.text().trim().is_empty() {
            return Err(RecorderError::grammar(
                self.scanner.position(),
                format!(
                    "non-blank line after end of double {SEPARATOR} separator section: {:?}",
                    self.scanner.text()
                ),
            ));
        }
        Ok(())
    }
}

/// Parses a whole in-memory recording.
pub fn parse_recording(text: &str, name: &str) -> Result<Vec<Operation>, RecorderError> {
    let mut parser = OperationParser::new(LineScanner::new(text.as_bytes(), name));
    let mut operations = Vec::new();
    while let Some(op) = parser.next_operation()? {
        operations.push(op);
    }
    Ok(operations)
}
