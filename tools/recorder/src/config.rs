use crate::errors::RecorderError;
use crate::runtime::FileSystem;
use crate::types::RecordMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4096;
pub const DEFAULT_DISK_BUDGET_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub recording_path: Option<PathBuf>,
    pub record: bool,
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub recording: RecordingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordingConfig {
    pub path: Option<PathBuf>,
    pub mode: Option<RecordMode>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub path: Option<PathBuf>,
    pub max_payload_bytes: usize,
    pub budget_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recording: RecordingConfig {
                path: None,
                mode: None,
                name: None,
            },
            logging: LoggingConfig {
                path: None,
                max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
                budget_bytes: DEFAULT_DISK_BUDGET_BYTES,
            },
        }
    }
}

impl AppConfig {
    /// `--record` wins; otherwise an explicit mode; otherwise replay whenever
    /// a recording path is known.
    pub fn effective_mode(&self) -> RecordMode {
        match (self.recording.mode, &self.recording.path) {
            (Some(mode), _) => mode,
            (None, Some(_)) => RecordMode::Replay,
            (None, None) => RecordMode::Off,
        }
    }

    /// Diagnostic name used in replay error positions.
    pub fn recording_name(&self) -> String {
        if let Some(name) = &self.recording.name {
            return name.clone();
        }
        self.recording
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "recording".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialAppConfig {
    recording: Option<PartialRecordingConfig>,
    logging: Option<PartialLoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialRecordingConfig {
    path: Option<PathBuf>,
    mode: Option<RecordMode>,
    name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLoggingConfig {
    path: Option<PathBuf>,
    max_payload_bytes: Option<usize>,
    budget_bytes: Option<u64>,
}

pub fn load_config(
    overrides: &CliOverrides,
    process_cwd: &Path,
    fs: &dyn FileSystem,
) -> Result<AppConfig, RecorderError> {
    let mut cfg = AppConfig::default();

    if let Some(path) = &overrides.config_path {
        let file_contents = fs.read_to_string(path)?;
        let partial: PartialAppConfig = toml::from_str(&file_contents)
            .map_err(|e| RecorderError::ConfigParse(e.to_string()))?;
        let base = path.parent().unwrap_or(process_cwd);
        merge_partial_config(&mut cfg, partial, &absolutize_path(process_cwd, base));
    }

    apply_cli_overrides(&mut cfg, overrides, process_cwd);
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Paths in a config file are relative to the file's directory.
fn merge_partial_config(cfg: &mut AppConfig, partial: PartialAppConfig, base: &Path) {
    if let Some(recording) = partial.recording {
        if let Some(path) = recording.path {
            cfg.recording.path = Some(absolutize_path(base, &path));
        }
        if let Some(mode) = recording.mode {
            cfg.recording.mode = Some(mode);
        }
        if let Some(name) = recording.name {
            cfg.recording.name = Some(name);
        }
    }

    if let Some(logging) = partial.logging {
        if let Some(path) = logging.path {
            cfg.logging.path = Some(absolutize_path(base, &path));
        }
        if let Some(value) = logging.max_payload_bytes {
            cfg.logging.max_payload_bytes = value;
        }
        if let Some(value) = logging.budget_bytes {
            cfg.logging.budget_bytes = value;
        }
    }
}

fn apply_cli_overrides(cfg: &mut AppConfig, overrides: &CliOverrides, process_cwd: &Path) {
    if let Some(path) = &overrides.recording_path {
        cfg.recording.path = Some(absolutize_path(process_cwd, path));
    }
    if overrides.record {
        cfg.recording.mode = Some(RecordMode::Record);
    }
    if let Some(path) = &overrides.log_path {
        cfg.logging.path = Some(absolutize_path(process_cwd, path));
    }
}

fn absolutize_path(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}

fn validate_config(cfg: &AppConfig) -> Result<(), RecorderError> {
    let mode = cfg.effective_mode();
    if mode.needs_recording_path() && cfg.recording.path.is_none() {
        return Err(RecorderError::InvalidConfig(format!(
            "recording.path is required when recording.mode is {}",
            mode.as_str()
        )));
    }

    if cfg.logging.max_payload_bytes == 0 {
        return Err(RecorderError::InvalidConfig(
            "logging.max_payload_bytes must be greater than zero".to_string(),
        ));
    }

    Ok(())
}
