//! The unified analysis model: the three central records plus the merged
//! finding set the correlation engine emits.
//!
//! Entities and issues are created exclusively by mappers through the
//! builders here, validated exactly once, and thereafter immutable.

pub mod entity;
pub mod issue;
pub mod merged;
pub mod result;

pub use entity::{EntityKind, UnifiedEntity};
pub use issue::{CorrelationHints, IssueBuilder, SearchRadius, SourceLocation, UnifiedIssue};
pub use merged::{HealthLevel, HealthReport, IssueGroup, MergedFindingSet};
pub use result::{RunMetadata, UnifiedResult};
