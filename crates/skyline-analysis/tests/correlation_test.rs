//! Correlation engine tests over hand-built unified results: cross-tool
//! grouping, order independence, and merged health scoring.

use skyline_analysis::CorrelationEngine;
use skyline_core::model::{
    CorrelationHints, EntityKind, IssueBuilder, RunMetadata, UnifiedEntity, UnifiedIssue,
    UnifiedResult,
};
use skyline_core::taxonomy::{AnalysisCategory, Severity};

// ─── Helpers ───────────────────────────────────────────────────────────────

fn file_issue(
    tool: &str,
    path: &str,
    line: u32,
    column: u32,
    severity: Severity,
    category: AnalysisCategory,
    patterns: &[&str],
    rule: &str,
) -> (UnifiedEntity, UnifiedIssue) {
    let entity = UnifiedEntity::build(EntityKind::File, path, path, path, tool, 1.0).unwrap();
    let issue = IssueBuilder::new(&entity, category, tool)
        .severity(severity)
        .title(rule)
        .rule_id(rule)
        .location_parts(Some(line), Some(column), Some(line), Some(column))
        .hints(CorrelationHints::with_patterns(patterns))
        .build()
        .unwrap();
    (entity, issue)
}

fn result_of(
    tool: &str,
    category: AnalysisCategory,
    records: Vec<(UnifiedEntity, UnifiedIssue)>,
) -> UnifiedResult {
    let (entities, issues): (Vec<_>, Vec<_>) = records.into_iter().unzip();
    UnifiedResult::build(
        tool,
        category,
        "/home/user/project",
        entities,
        issues,
        RunMetadata::now(),
        1,
    )
    .unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// GROUPING
// ═══════════════════════════════════════════════════════════════════════════

/// eslint flags an unused variable at 10:4; a second tool flags dead code
/// two lines below. Same file, within radius, shared pattern: one group.
#[test]
fn dead_code_findings_group_across_tools() {
    let eslint = result_of(
        "eslint",
        AnalysisCategory::StaticQuality,
        vec![file_issue(
            "eslint",
            "src/a.ts",
            10,
            4,
            Severity::Medium,
            AnalysisCategory::StaticQuality,
            &["dead_code"],
            "no-unused-vars",
        )],
    );
    let mypy = result_of(
        "mypy",
        AnalysisCategory::TypeChecking,
        vec![file_issue(
            "mypy",
            "src/a.ts",
            12,
            4,
            Severity::Low,
            AnalysisCategory::TypeChecking,
            &["dead_code"],
            "unused-ignore",
        )],
    );

    let merged = CorrelationEngine::new().merge(&[eslint.clone(), mypy.clone()]);

    assert_eq!(merged.total_issues, 2);
    assert_eq!(merged.groups.len(), 1);
    assert!(merged.ungrouped.is_empty());

    let group = &merged.groups[0];
    assert_eq!(group.canonical_path, "src/a.ts");
    assert_eq!(group.tools, vec!["eslint", "mypy"]);
    assert_eq!(group.shared_patterns, vec!["dead_code"]);
    assert_eq!(group.max_severity, Severity::Medium);

    let mut expected_ids = vec![eslint.issues[0].id.clone(), mypy.issues[0].id.clone()];
    expected_ids.sort();
    assert_eq!(group.issue_ids, expected_ids);

    // The group key is the smallest member key.
    let min_key = eslint.issues[0]
        .correlation_key
        .clone()
        .min(mypy.issues[0].correlation_key.clone());
    assert_eq!(group.key, min_key);
}

#[test]
fn findings_beyond_the_radius_stay_ungrouped() {
    let near = result_of(
        "eslint",
        AnalysisCategory::StaticQuality,
        vec![file_issue(
            "eslint",
            "src/a.ts",
            10,
            4,
            Severity::Medium,
            AnalysisCategory::StaticQuality,
            &["dead_code"],
            "no-unused-vars",
        )],
    );
    let far = result_of(
        "mypy",
        AnalysisCategory::TypeChecking,
        vec![file_issue(
            "mypy",
            "src/a.ts",
            100,
            4,
            Severity::Low,
            AnalysisCategory::TypeChecking,
            &["dead_code"],
            "unused-ignore",
        )],
    );

    let merged = CorrelationEngine::new().merge(&[near, far]);
    assert!(merged.groups.is_empty());
    assert_eq!(merged.ungrouped.len(), 2);
    assert!(merged.ungrouped.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn disjoint_pattern_sets_never_group() {
    let a = result_of(
        "eslint",
        AnalysisCategory::StaticQuality,
        vec![file_issue(
            "eslint",
            "src/a.ts",
            10,
            4,
            Severity::Medium,
            AnalysisCategory::StaticQuality,
            &["dead_code"],
            "no-unused-vars",
        )],
    );
    let b = result_of(
        "pylint",
        AnalysisCategory::StaticQuality,
        vec![file_issue(
            "pylint",
            "src/a.ts",
            10,
            4,
            Severity::Low,
            AnalysisCategory::StaticQuality,
            &["naming_convention"],
            "C0103",
        )],
    );

    let merged = CorrelationEngine::new().merge(&[a, b]);
    assert!(merged.groups.is_empty());
    assert_eq!(merged.ungrouped.len(), 2);
}

#[test]
fn different_files_never_group() {
    let a = result_of(
        "eslint",
        AnalysisCategory::StaticQuality,
        vec![file_issue(
            "eslint",
            "src/a.ts",
            10,
            4,
            Severity::Medium,
            AnalysisCategory::StaticQuality,
            &["dead_code"],
            "no-unused-vars",
        )],
    );
    let b = result_of(
        "mypy",
        AnalysisCategory::TypeChecking,
        vec![file_issue(
            "mypy",
            "src/b.ts",
            10,
            4,
            Severity::Low,
            AnalysisCategory::TypeChecking,
            &["dead_code"],
            "unused-ignore",
        )],
    );

    let merged = CorrelationEngine::new().merge(&[a, b]);
    assert!(merged.groups.is_empty());
}

#[test]
fn merge_is_order_independent() {
    let eslint = result_of(
        "eslint",
        AnalysisCategory::StaticQuality,
        vec![
            file_issue(
                "eslint",
                "src/a.ts",
                10,
                4,
                Severity::Medium,
                AnalysisCategory::StaticQuality,
                &["dead_code"],
                "no-unused-vars",
            ),
            file_issue(
                "eslint",
                "src/c.ts",
                7,
                1,
                Severity::Low,
                AnalysisCategory::StaticQuality,
                &["naming_convention"],
                "camelcase",
            ),
        ],
    );
    let mypy = result_of(
        "mypy",
        AnalysisCategory::TypeChecking,
        vec![file_issue(
            "mypy",
            "src/a.ts",
            12,
            4,
            Severity::Low,
            AnalysisCategory::TypeChecking,
            &["dead_code"],
            "unused-ignore",
        )],
    );

    let engine = CorrelationEngine::new();
    let forward = engine.merge(&[eslint.clone(), mypy.clone()]);
    let backward = engine.merge(&[mypy, eslint]);
    assert_eq!(forward, backward);
}

#[test]
fn failed_and_skipped_results_contribute_nothing() {
    let failed = UnifiedResult::empty_with_error(
        "pylint",
        AnalysisCategory::StaticQuality,
        "/home/user/project",
        "tool exited with code 32",
        5,
    );
    let skipped = UnifiedResult::skipped(
        "cbmc",
        AnalysisCategory::FormalVerification,
        "/home/user/project",
        "version probe exited with Some(127)",
    );

    let merged = CorrelationEngine::new().merge(&[failed, skipped]);
    assert_eq!(merged.total_issues, 0);
    assert!(merged.groups.is_empty());
    assert!(merged.ungrouped.is_empty());
    assert_eq!(merged.health.score, 100);
}

// ═══════════════════════════════════════════════════════════════════════════
// HEALTH
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn one_critical_vulnerability_costs_ten_points() {
    let result = result_of(
        "osv-scanner",
        AnalysisCategory::DependencySecurity,
        vec![file_issue(
            "osv-scanner",
            "target/package/openssl",
            1,
            1,
            Severity::Critical,
            AnalysisCategory::DependencySecurity,
            &["security_vulnerability"],
            "GHSA-xxxx",
        )],
    );

    let merged = CorrelationEngine::new().merge(&[result]);
    assert_eq!(merged.health.score, 90);
    assert_eq!(
        merged.health.penalties.get("critical_security"),
        Some(&10)
    );
    assert_eq!(merged.health.level.name(), "excellent");
}

#[test]
fn verification_failures_weigh_on_health() {
    let records = (0..3)
        .map(|i| {
            file_issue(
                "cbmc",
                "src/buffer.c",
                40 + i * 20,
                1,
                Severity::High,
                AnalysisCategory::FormalVerification,
                &["memory_safety"],
                "bounds-check",
            )
        })
        .collect();
    let result = result_of("cbmc", AnalysisCategory::FormalVerification, records);

    let merged = CorrelationEngine::new().merge(&[result]);
    assert_eq!(merged.health.score, 76);
    assert_eq!(merged.health.penalties.get("failed_verification"), Some(&24));
    assert_eq!(merged.health.level.name(), "good");
}
