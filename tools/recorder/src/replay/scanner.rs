//! Line-at-a-time reader over a recording, tracking position for diagnostics.

use crate::errors::RecorderError;
use std::io::BufRead;

pub struct LineScanner<R> {
    reader: R,
    name: String,
    line_number: usize,
    current: String,
}

impl<R: BufRead> LineScanner<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: name.into(),
            line_number: 0,
            current: String::new(),
        }
    }

    /// Advance to the next line. Returns `Ok(false)` at end of stream, after
    /// which `text()` is empty.
    pub fn scan(&mut self) -> Result<bool, RecorderError> {
        self.current.clear();
        let read = self
            .reader
            .read_line(&mut self.current)
            .map_err(|e| RecorderError::Io(format!("{}: {e}", self.position_after_current())))?;
        if read == 0 {
            return Ok(false);
        }
        if self.current.ends_with('\n') {
            self.current.pop();
            if self.current.ends_with('\r') {
                self.current.pop();
            }
        }
        self.line_number += 1;
        Ok(true)
    }

    /// The current line with its terminator stripped.
    pub fn text(&self) -> &str {
        &self.current
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// `<name>:<line>` of the most recently scanned line.
    pub fn position(&self) -> String {
        format!("{}:{}", self.name, self.line_number)
    }

    fn position_after_current(&self) -> String {
        format!("{}:{}", self.name, self.line_number + 1)
    }
}
