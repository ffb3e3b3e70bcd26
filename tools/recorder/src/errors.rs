use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("io error: {0}")]
    Io(String),
    #[error("misconfigured recorder; {0}")]
    Misconfigured(String),
    #[error("{position}: {message}")]
    Grammar { position: String, message: String },
    #[error("{position}: recorded command {recorded:?} does not match requested command {requested:?}")]
    Mismatch {
        position: String,
        recorded: String,
        requested: String,
    },
    #[error("{position}: recording for command {command:?} not found")]
    NotFound { command: String, position: String },
    #[error("cannot record operation: {0}")]
    Unrepresentable(String),
    #[error("{position}: replay halted after an earlier error")]
    Halted { position: String },
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("cli error: {0}")]
    Cli(String),
    #[error("process error: {0}")]
    Process(String),
}

impl RecorderError {
    pub fn grammar(position: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Grammar {
            position: position.into(),
            message: message.into(),
        }
    }
}
