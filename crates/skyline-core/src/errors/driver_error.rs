//! Errors produced by the tool driver kernel.

use super::error_code::{self, SkylineErrorCode};

/// Errors that can occur while running an external tool.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Unsafe argument rejected: {argument:?}")]
    UnsafeArgument { argument: String },

    #[error("Working directory must be absolute: {path}")]
    InvalidWorkingDir { path: String },

    #[error("Tool unavailable: {executable} ({message})")]
    ToolUnavailable { executable: String, message: String },

    #[error("Hard deadline expired after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Output exceeded the {limit_bytes}-byte budget; child killed")]
    OutputExceeded { limit_bytes: usize },

    #[error("I/O error during run: {message}")]
    Io { message: String },

    #[error("Run cancelled by caller")]
    Cancelled,
}

impl SkylineErrorCode for DriverError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsafeArgument { .. } => error_code::UNSAFE_ARGUMENT,
            Self::InvalidWorkingDir { .. } => error_code::INVALID_WORKING_DIR,
            Self::ToolUnavailable { .. } => error_code::TOOL_UNAVAILABLE,
            Self::Timeout { .. } => error_code::TIMEOUT,
            Self::OutputExceeded { .. } => error_code::OUTPUT_EXCEEDED,
            Self::Io { .. } => error_code::DRIVER_IO,
            Self::Cancelled => error_code::CANCELLED,
        }
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            message: e.to_string(),
        }
    }
}
