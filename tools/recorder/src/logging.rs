use crate::config::LoggingConfig;
use crate::errors::RecorderError;
use crate::log_retention::enforce_total_budget;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonlLogger {
    pub path: PathBuf,
    pub max_payload_bytes: usize,
    pub budget_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent<'a> {
    pub level: &'a str,
    pub event_type: &'a str,
    pub payload: Value,
}

impl JsonlLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_payload_bytes: crate::config::DEFAULT_MAX_PAYLOAD_BYTES,
            budget_bytes: crate::config::DEFAULT_DISK_BUDGET_BYTES,
        }
    }

    /// `None` when logging is not configured.
    pub fn from_config(cfg: &LoggingConfig) -> Option<Self> {
        let path = cfg.path.as_ref()?;
        Some(Self {
            path: path.clone(),
            max_payload_bytes: cfg.max_payload_bytes,
            budget_bytes: cfg.budget_bytes,
        })
    }

    pub fn append(&self, event: &LogEvent<'_>) -> Result<(), RecorderError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| RecorderError::Io(e.to_string()))?;
        }
        let truncated = truncate_json(event.payload.clone(), self.max_payload_bytes);
        let line = serde_json::to_string(&LogEvent {
            level: event.level,
            event_type: event.event_type,
            payload: truncated,
        })
        .map_err(|e| RecorderError::Io(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| RecorderError::Io(format!("{}: {e}", self.path.display())))?;
        writeln!(file, "{line}").map_err(|e| RecorderError::Io(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            enforce_total_budget(parent, self.budget_bytes)?;
        }

        Ok(())
    }

    pub fn info(&self, event_type: &str, payload: Value) -> Result<(), RecorderError> {
        self.append(&LogEvent {
            level: "info",
            event_type,
            payload,
        })
    }

    pub fn error(&self, event_type: &str, payload: Value) -> Result<(), RecorderError> {
        self.append(&LogEvent {
            level: "error",
            event_type,
            payload,
        })
    }
}

pub fn structured_fallback_line(mode: &str, event: &str, message: &str) -> String {
    format!(
        "mode={mode} event={event} message={} ",
        message.replace('\n', "\\n")
    )
}

fn truncate_json(value: Value, max_bytes: usize) -> Value {
    let rendered = serde_json::to_string(&value).unwrap_or_default();
    if rendered.len() <= max_bytes {
        return value;
    }
    let mut cut = max_bytes.saturating_sub(3);
    while cut > 0 && !rendered.is_char_boundary(cut) {
        cut -= 1;
    }
    Value::String(format!("{}...", &rendered[..cut]))
}
