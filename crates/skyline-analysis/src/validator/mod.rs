//! Contract checks over unified issues.
//!
//! The validator re-checks schema invariants at the pipeline boundary and
//! enforces adapter-declared metadata requirements. Violating issues are
//! dropped from the result, never from the tool's raw output, and every
//! drop leaves a validation record in the result's run metadata.

use serde::{Deserialize, Serialize};

use serde_json::Value;

use skyline_core::model::{UnifiedIssue, UnifiedResult};
use skyline_core::{FxHashMap, FxHashSet};

use crate::adapters::{create_default_registry, AdapterRegistry};

/// One failed contract check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub issue_id: String,
    /// Stable rule name, e.g. `missing_metadata`, `unknown_entity`.
    pub rule: String,
    pub message: String,
}

impl Violation {
    fn new(issue: &UnifiedIssue, rule: &str, message: impl Into<String>) -> Self {
        Self {
            issue_id: issue.id.clone(),
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

/// Summary of one result's validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSummary {
    pub dropped: usize,
    pub kept: usize,
    /// Share of kept issues ready for cross-tool correlation: a non-empty
    /// correlation key plus at least one declared pattern tag. 100 for an
    /// empty result.
    pub correlation_readiness_pct: u32,
}

pub struct Validator {
    /// Tool name → metadata fields its issues must carry.
    required_metadata: FxHashMap<String, Vec<String>>,
}

impl Validator {
    pub fn new() -> Self {
        Self::from_registry(&create_default_registry())
    }

    pub fn from_registry(registry: &AdapterRegistry) -> Self {
        let mut required_metadata = FxHashMap::default();
        for adapter in registry.iter_enabled() {
            let fields: Vec<String> = adapter
                .required_metadata()
                .iter()
                .map(|f| f.to_string())
                .collect();
            if !fields.is_empty() {
                required_metadata.insert(adapter.name().to_string(), fields);
            }
        }
        Self { required_metadata }
    }

    /// Contract-check a single issue. Empty = valid.
    pub fn validate_issue(&self, issue: &UnifiedIssue, known_entities: &FxHashSet<&str>) -> Vec<Violation> {
        let mut violations = Vec::new();

        if issue.title.trim().is_empty() {
            violations.push(Violation::new(issue, "empty_title", "issue has no title"));
        }

        if !known_entities.contains(issue.entity_id.as_str()) {
            violations.push(Violation::new(
                issue,
                "unknown_entity",
                format!("entity {} not present in result", issue.entity_id),
            ));
        }

        if let Some(loc) = issue.location {
            if loc.line == 0 || loc.column == 0 || loc.end_line < loc.line {
                violations.push(Violation::new(
                    issue,
                    "invalid_location",
                    format!("location {}:{} is not 1-based and ordered", loc.line, loc.column),
                ));
            }
        }

        if let Some(fields) = self.required_metadata.get(&issue.tool) {
            for field in fields {
                if !issue.metadata.contains_key(field) {
                    violations.push(Violation::new(
                        issue,
                        "missing_metadata",
                        format!("required metadata field `{field}` is absent"),
                    ));
                }
            }
        }

        // A cyclic-dependency claim is only actionable with the cycle itself.
        let claims_cycle = issue
            .hints
            .cross_tool_patterns
            .iter()
            .any(|p| p == "circular_dependency");
        if claims_cycle && !issue.metadata.contains_key("dependency_chain") {
            violations.push(Violation::new(
                issue,
                "missing_metadata",
                "circular_dependency issues must carry `dependency_chain`",
            ));
        }

        violations
    }

    /// Validate every issue in a result, dropping violators and recording
    /// each drop in the result's run metadata.
    pub fn validate_result(&self, result: &mut UnifiedResult) -> ValidationSummary {
        let known: FxHashSet<&str> = result.entities.iter().map(|e| e.id.as_str()).collect();

        let mut records: Vec<Violation> = Vec::new();
        let mut dropped = 0usize;
        let issues = std::mem::take(&mut result.issues);
        let mut kept = Vec::with_capacity(issues.len());

        for issue in issues {
            let violations = self.validate_issue(&issue, &known);
            if violations.is_empty() {
                kept.push(issue);
            } else {
                tracing::warn!(
                    tool = %result.tool,
                    issue = %issue.id,
                    count = violations.len(),
                    "issue dropped by validator"
                );
                dropped += 1;
                records.extend(violations);
            }
        }

        let ready = kept
            .iter()
            .filter(|i| !i.correlation_key.is_empty() && !i.hints.cross_tool_patterns.is_empty())
            .count();
        let correlation_readiness_pct = if kept.is_empty() {
            100
        } else {
            ((ready * 100) / kept.len()) as u32
        };

        let summary = ValidationSummary {
            dropped,
            kept: kept.len(),
            correlation_readiness_pct,
        };

        result.issues = kept;
        if !records.is_empty() {
            if let Ok(value) = serde_json::to_value(&records) {
                result.run.extra.insert("validation".to_string(), value);
            }
        }
        result.run.extra.insert(
            "correlation_readiness_pct".to_string(),
            Value::from(correlation_readiness_pct),
        );

        summary
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use skyline_core::model::{
        CorrelationHints, EntityKind, IssueBuilder, RunMetadata, UnifiedEntity,
    };
    use skyline_core::taxonomy::AnalysisCategory;

    fn entity() -> UnifiedEntity {
        UnifiedEntity::build(
            EntityKind::Package,
            "lodash",
            "node_modules/lodash",
            "lodash",
            "npm-audit",
            1.0,
        )
        .unwrap()
    }

    fn result_with(entities: Vec<UnifiedEntity>, issues: Vec<UnifiedIssue>) -> UnifiedResult {
        UnifiedResult::build(
            "npm-audit",
            AnalysisCategory::DependencySecurity,
            "/p",
            entities,
            issues,
            RunMetadata::now(),
            1,
        )
        .unwrap()
    }

    #[test]
    fn missing_required_metadata_drops_issue() {
        let e = entity();
        let issue = IssueBuilder::new(&e, AnalysisCategory::DependencySecurity, "npm-audit")
            .title("Prototype Pollution")
            .hints(CorrelationHints::with_patterns(&["security_vulnerability"]))
            .build()
            .unwrap();
        let mut result = result_with(vec![e], vec![issue]);

        let summary = Validator::new().validate_result(&mut result);
        assert_eq!(summary.kept, 0);
        assert_eq!(summary.dropped, 1);
        assert!(result.issues.is_empty());
        assert!(result.run.extra.contains_key("validation"));
    }

    #[test]
    fn compliant_issue_survives() {
        let e = entity();
        let mut metadata = BTreeMap::new();
        metadata.insert("package_name".to_string(), Value::from("lodash"));
        let issue = IssueBuilder::new(&e, AnalysisCategory::DependencySecurity, "npm-audit")
            .title("Prototype Pollution")
            .metadata(metadata)
            .hints(CorrelationHints::with_patterns(&["security_vulnerability"]))
            .build()
            .unwrap();
        let mut result = result_with(vec![e], vec![issue]);

        let summary = Validator::new().validate_result(&mut result);
        assert_eq!(summary.kept, 1);
        assert_eq!(summary.dropped, 0);
        assert_eq!(summary.correlation_readiness_pct, 100);
    }

    #[test]
    fn cycle_claim_without_chain_is_dropped() {
        let e = UnifiedEntity::build(EntityKind::File, "a.py", "src/a.py", "a", "pylint", 1.0)
            .unwrap();
        let issue = IssueBuilder::new(&e, AnalysisCategory::StaticQuality, "pylint")
            .title("Cyclic import (a -> b -> a)")
            .hints(CorrelationHints::with_patterns(&["circular_dependency"]))
            .build()
            .unwrap();
        let mut result = UnifiedResult::build(
            "pylint",
            AnalysisCategory::StaticQuality,
            "/p",
            vec![e],
            vec![issue],
            RunMetadata::now(),
            1,
        )
        .unwrap();

        let summary = Validator::new().validate_result(&mut result);
        assert_eq!(summary.kept, 0);
        assert_eq!(summary.dropped, 1);
    }

    #[test]
    fn kept_issue_without_patterns_lowers_readiness() {
        let e = entity();
        let mut metadata = BTreeMap::new();
        metadata.insert("package_name".to_string(), Value::from("lodash"));
        let issue = IssueBuilder::new(&e, AnalysisCategory::DependencySecurity, "npm-audit")
            .title("Prototype Pollution")
            .metadata(metadata)
            .build()
            .unwrap();
        let mut result = result_with(vec![e], vec![issue]);

        let summary = Validator::new().validate_result(&mut result);
        assert_eq!(summary.kept, 1);
        assert_eq!(summary.correlation_readiness_pct, 0);
    }

    #[test]
    fn empty_result_is_fully_ready() {
        let mut result = result_with(Vec::new(), Vec::new());
        let summary = Validator::new().validate_result(&mut result);
        assert_eq!(summary.correlation_readiness_pct, 100);
    }
}
