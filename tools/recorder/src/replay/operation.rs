//! The unit of recording: a command and the output it produced.
//!
//! Printed form:
//!
//! ```text
//! # comment
//! <command> \
//! <command wraps over onto the next line>
//! ----
//! <output>
//! ```
//!
//! `<output>` ends at the first blank line. Output that itself contains blank
//! lines is wrapped in a doubled separator:
//!
//! ```text
//! <command>
//! ----
//! ----
//! <output>
//!
//! <more output>
//! ----
//! ----
//! ```

use crate::errors::RecorderError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SEPARATOR: &str = "----";
pub const COMMENT_PREFIX: char = '#';
pub const CONTINUATION: char = '\\';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub command: String,
    pub output: String,
}

impl Operation {
    pub fn new(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Whether the output has to be written in the doubled-separator form.
    pub fn needs_escape(&self) -> bool {
        if self.output.is_empty() {
            return false;
        }
        let body = self.output.strip_suffix('\n').unwrap_or(&self.output);
        if body.split('\n').next() == Some(SEPARATOR) {
            return true;
        }
        body.split('\n').any(|line| line.trim().is_empty())
    }

    /// Checks the command can be written as a single logical command line.
    pub fn validate_command(&self) -> Result<(), RecorderError> {
        let command = self.command.trim();
        let reason = if command.is_empty() {
            Some("command is empty")
        } else if command != self.command {
            Some("command has surrounding whitespace")
        } else if command.contains(['\n', '\r']) {
            Some("command spans multiple lines")
        } else if command.starts_with(COMMENT_PREFIX) {
            Some("command would be read back as a comment")
        } else if command.ends_with(CONTINUATION) {
            Some("command would be read back as a continued line")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(RecorderError::Unrepresentable(format!(
                "{reason}: {:?}",
                self.command
            ))),
            None => Ok(()),
        }
    }

    /// Canonical serialized form, including the trailing blank line.
    pub fn to_recording(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.command)?;
        writeln!(f, "{SEPARATOR}")?;

        let escaped = self.needs_escape();
        if escaped {
            writeln!(f, "{SEPARATOR}")?;
        }

        f.write_str(&self.output)?;
        if !self.output.is_empty() && !self.output.ends_with('\n') {
            writeln!(f)?;
        }

        if escaped {
            writeln!(f, "{SEPARATOR}")?;
            writeln!(f, "{SEPARATOR}")?;
        }

        writeln!(f)
    }
}
