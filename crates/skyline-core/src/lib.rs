//! # skyline-core
//!
//! Foundation crate for the Skyline analysis pipeline.
//! Defines the unified analysis model, severity/category taxonomy,
//! canonical path and identifier machinery, config, and errors.
//! The pipeline crate (`skyline-analysis`) depends on this.

pub mod canonical;
pub mod config;
pub mod errors;
pub mod model;
pub mod taxonomy;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::AnalyzerConfig;
pub use errors::error_code::SkylineErrorCode;
pub use errors::{DriverError, MapError, OrchestratorError, SchemaError};
pub use model::{
    CorrelationHints, EntityKind, MergedFindingSet, RunMetadata, SourceLocation, UnifiedEntity,
    UnifiedIssue, UnifiedResult,
};
pub use taxonomy::{AnalysisCategory, Severity};
pub use types::collections::{FxHashMap, FxHashSet};
