use serde::{Deserialize, Serialize};

/// Which backend a `Recorder` is built with. Fixed for the recorder's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordMode {
    Off,
    Record,
    Replay,
}

impl RecordMode {
    pub fn parse_cli(value: &str) -> Option<Self> {
        match value {
            "off" => Some(Self::Off),
            "record" => Some(Self::Record),
            "replay" => Some(Self::Replay),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Record => "record",
            Self::Replay => "replay",
        }
    }

    pub fn needs_recording_path(self) -> bool {
        matches!(self, Self::Record | Self::Replay)
    }
}

#[cfg(test)]
mod tests {
    use super::RecordMode;

    #[test]
    fn cli_names_round_trip() {
        for mode in [RecordMode::Off, RecordMode::Record, RecordMode::Replay] {
            assert_eq!(RecordMode::parse_cli(mode.as_str()), Some(mode));
        }
        assert_eq!(RecordMode::parse_cli("rewrite"), None);
    }
}
