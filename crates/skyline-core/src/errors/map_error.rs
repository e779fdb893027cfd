//! Mapper-side errors: a tool's raw output could not be decoded.

use super::error_code::{self, SkylineErrorCode};

/// Raised when a mapper cannot decode raw tool output at all.
///
/// Per-record failures are dropped with a warning instead; this error is the
/// whole-run collapse ("empty result carrying the error string in metadata").
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("{tool} output could not be parsed: {message}")]
    Parse { tool: String, message: String },
}

impl MapError {
    pub fn parse(tool: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

impl SkylineErrorCode for MapError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => error_code::PARSE_ERROR,
        }
    }
}
