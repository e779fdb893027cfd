//! Violations of the unified-model invariants.
//!
//! Raised only by the schema constructors — the single place raw tool
//! output crosses into the trusted model.

use super::error_code::{self, SkylineErrorCode};

/// Errors produced by `UnifiedEntity`/`UnifiedIssue`/`UnifiedResult` builders.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Confidence {value} outside [0.0, 1.0]")]
    InvalidConfidence { value: f64 },

    #[error("Canonical path escapes the project root: {path}")]
    PathEscapesRoot { path: String },

    #[error("Partial source location: {present} of 4 coordinates present")]
    PartialLocation { present: usize },

    #[error("Location coordinates must be 1-based (line {line}, column {column})")]
    InvalidLocation { line: u32, column: u32 },

    #[error("Issue {issue_id} references entity {entity_id} absent from the result")]
    UnknownEntity { issue_id: String, entity_id: String },

    #[error("Required field empty: {field}")]
    EmptyField { field: &'static str },
}

impl SkylineErrorCode for SchemaError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfidence { .. } => error_code::SCHEMA_INVALID_CONFIDENCE,
            Self::PathEscapesRoot { .. } => error_code::SCHEMA_PATH_ESCAPES_ROOT,
            Self::PartialLocation { .. } => error_code::SCHEMA_PARTIAL_LOCATION,
            Self::InvalidLocation { .. } => error_code::SCHEMA_INVALID_LOCATION,
            Self::UnknownEntity { .. } => error_code::SCHEMA_UNKNOWN_ENTITY,
            Self::EmptyField { .. } => error_code::SCHEMA_ERROR,
        }
    }
}
