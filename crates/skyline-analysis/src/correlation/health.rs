//! Aggregate health scoring over the merged finding set.
//!
//! Starts at 100 and subtracts per-finding penalties. Each issue lands in
//! exactly one penalty bucket; buckets are checked from heaviest to
//! lightest so an issue qualifying twice pays its largest penalty once.

use std::collections::BTreeMap;

use skyline_core::model::{HealthLevel, HealthReport};
use skyline_core::taxonomy::{AnalysisCategory, Severity};

use super::grouping::IssueRef;

const PENALTY_CRITICAL_MEMORY: u32 = 15;
const PENALTY_CRITICAL_STATIC: u32 = 12;
const PENALTY_CRITICAL_SECURITY: u32 = 10;
const PENALTY_FAILED_VERIFICATION: u32 = 8;
const PENALTY_CRITICAL_PERFORMANCE: u32 = 6;
const PENALTY_HIGH_SECURITY: u32 = 5;
const PENALTY_CYCLIC_DEPENDENCY: u32 = 5;

pub(crate) fn score(refs: &[IssueRef]) -> HealthReport {
    let mut penalties: BTreeMap<String, u32> = BTreeMap::new();
    let mut add = |name: &str, points: u32| {
        *penalties.entry(name.to_string()).or_insert(0) += points;
    };

    for r in refs {
        if let Some((name, points)) = classify(r) {
            add(name, points);
        }
    }

    let total: u32 = penalties.values().sum();
    let score = 100u32.saturating_sub(total);
    HealthReport {
        score,
        level: HealthLevel::from_score(score),
        penalties,
    }
}

/// Penalty bucket for one finding, heaviest applicable bucket first.
/// Categories carry no memory or performance variant, so those buckets key
/// off the mapper-declared cross-tool pattern tags.
fn classify(r: &IssueRef) -> Option<(&'static str, u32)> {
    let security = matches!(
        r.category,
        AnalysisCategory::DependencySecurity | AnalysisCategory::ApplicationSecurity
    );
    let has = |tag: &str| r.patterns.iter().any(|p| p == tag);

    if r.severity == Severity::Critical && has("memory_safety") {
        return Some(("critical_memory", PENALTY_CRITICAL_MEMORY));
    }
    if r.severity == Severity::Critical && r.category == AnalysisCategory::StaticQuality {
        return Some(("critical_static", PENALTY_CRITICAL_STATIC));
    }
    if r.severity == Severity::Critical && security {
        return Some(("critical_security", PENALTY_CRITICAL_SECURITY));
    }
    if r.category == AnalysisCategory::FormalVerification {
        return Some(("failed_verification", PENALTY_FAILED_VERIFICATION));
    }
    if r.severity == Severity::Critical
        && (has("performance") || has("complexity_hotspot"))
    {
        return Some(("critical_performance", PENALTY_CRITICAL_PERFORMANCE));
    }
    if r.severity == Severity::High && security {
        return Some(("high_security", PENALTY_HIGH_SECURITY));
    }
    if has("circular_dependency") {
        return Some(("cyclic_dependency", PENALTY_CYCLIC_DEPENDENCY));
    }
    None
}
