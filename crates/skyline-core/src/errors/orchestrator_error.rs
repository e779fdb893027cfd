//! Orchestrator-level errors.
//!
//! Adapter failures never surface here — they are folded into that adapter's
//! result metadata. Only bookkeeping bugs and an unusable project root abort
//! the orchestrator as a whole.

use super::error_code::{self, SkylineErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Project root is not a readable directory: {path}")]
    ProjectRootInvalid { path: String },

    #[error("Internal invariant violated: {message}")]
    Internal { message: String },
}

impl SkylineErrorCode for OrchestratorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ProjectRootInvalid { .. } => error_code::PROJECT_ROOT_INVALID,
            Self::Internal { .. } => error_code::ORCHESTRATOR_ERROR,
        }
    }
}
