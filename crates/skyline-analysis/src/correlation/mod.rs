//! The correlation engine: cross-tool grouping and the aggregate health
//! merge over a collection of unified results.

pub mod grouping;
mod health;

pub use grouping::{Collecting, Grouped, Keyed, MergeBuilder};

use skyline_core::model::{MergedFindingSet, UnifiedResult};

/// Merges per-tool results into one grouped, scored finding set.
#[derive(Debug, Clone, Default)]
pub struct CorrelationEngine;

impl CorrelationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Group correlated issues across results and compute the health report.
    /// Deterministic: the same results produce the same merged set
    /// regardless of input order.
    pub fn merge(&self, results: &[UnifiedResult]) -> MergedFindingSet {
        let mut builder = MergeBuilder::new();
        for result in results {
            builder.add_result(result);
        }
        let (groups, ungrouped, refs) = builder.keyed().grouped().into_parts();

        let health = health::score(&refs);
        let total_issues = refs.len();

        MergedFindingSet {
            groups,
            ungrouped,
            health,
            total_issues,
        }
    }
}
