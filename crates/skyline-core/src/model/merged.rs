//! The merged finding set — the correlation engine's output.
//!
//! Groups reference issues by id and never copy them.

use serde::{Deserialize, Serialize};

use crate::taxonomy::Severity;

/// Overall project health derived from categorized finding counts.
/// A summary for consumers only; never used to drop or reorder findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            90..=u32::MAX => Self::Excellent,
            75..=89 => Self::Good,
            60..=74 => Self::Fair,
            40..=59 => Self::Poor,
            _ => Self::Critical,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::Critical => "critical",
        }
    }
}

/// Health score plus the penalty breakdown that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub score: u32,
    pub level: HealthLevel,
    /// Penalty name → total points subtracted, sorted by name.
    pub penalties: std::collections::BTreeMap<String, u32>,
}

/// One cross-tool group of correlated issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueGroup {
    /// Group correlation key: the lexicographically smallest member key.
    pub key: String,
    pub canonical_path: String,
    /// Member issue ids, sorted.
    pub issue_ids: Vec<String>,
    /// Distinct tools contributing to the group, sorted.
    pub tools: Vec<String>,
    /// The intersecting cross-tool pattern tags, sorted.
    pub shared_patterns: Vec<String>,
    pub max_severity: Severity,
}

/// The terminal, externally visible state of a merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedFindingSet {
    /// Groups sorted by group correlation key.
    pub groups: Vec<IssueGroup>,
    /// Issue ids that joined no group, sorted.
    pub ungrouped: Vec<String>,
    pub health: HealthReport,
    pub total_issues: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_levels_from_score() {
        assert_eq!(HealthLevel::from_score(100), HealthLevel::Excellent);
        assert_eq!(HealthLevel::from_score(90), HealthLevel::Excellent);
        assert_eq!(HealthLevel::from_score(89), HealthLevel::Good);
        assert_eq!(HealthLevel::from_score(75), HealthLevel::Good);
        assert_eq!(HealthLevel::from_score(60), HealthLevel::Fair);
        assert_eq!(HealthLevel::from_score(40), HealthLevel::Poor);
        assert_eq!(HealthLevel::from_score(39), HealthLevel::Critical);
        assert_eq!(HealthLevel::from_score(0), HealthLevel::Critical);
    }
}
