//! Schema invariants exercised end to end across the model builders.

use std::collections::BTreeMap;

use skyline_core::canonical::entity_id;
use skyline_core::errors::SchemaError;
use skyline_core::model::{
    CorrelationHints, EntityKind, IssueBuilder, RunMetadata, UnifiedEntity, UnifiedResult,
};
use skyline_core::taxonomy::{AnalysisCategory, Severity, SeverityMapper};

// ─── Helpers ───────────────────────────────────────────────────────────────

fn file_entity(path: &str, tool: &str) -> UnifiedEntity {
    let name = path.rsplit('/').next().unwrap();
    UnifiedEntity::build(EntityKind::File, name, path, path, tool, 1.0).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// ENTITY IDENTITY
// ═══════════════════════════════════════════════════════════════════════════

/// Two entities with identical (kind, canonical path) share an id even when
/// produced by different tools.
#[test]
fn entity_id_independent_of_tool() {
    let a = file_entity("src/app.py", "pylint");
    let b = file_entity("src/app.py", "mypy");
    assert_eq!(a.id, b.id);
    assert_eq!(a.id, entity_id(EntityKind::File, "src/app.py"));
}

#[test]
fn entity_id_scoped_by_kind() {
    let file = UnifiedEntity::build(
        EntityKind::File,
        "package.json",
        "package.json",
        "package.json",
        "eslint",
        1.0,
    )
    .unwrap();
    let manifest = UnifiedEntity::build(
        EntityKind::Manifest,
        "package.json",
        "package.json",
        "package.json",
        "npm-audit",
        1.0,
    )
    .unwrap();
    assert_ne!(file.id, manifest.id);
}

#[test]
fn entity_rejects_dotdot_and_bad_confidence() {
    let escape = UnifiedEntity::build(
        EntityKind::File,
        "passwd",
        "../etc/passwd",
        "../etc/passwd",
        "eslint",
        1.0,
    );
    assert!(matches!(escape, Err(SchemaError::PathEscapesRoot { .. })));

    let over = UnifiedEntity::build(EntityKind::File, "a", "src/a.py", "a", "pylint", 1.5);
    assert!(matches!(over, Err(SchemaError::InvalidConfidence { .. })));
}

// ═══════════════════════════════════════════════════════════════════════════
// ISSUE CONSTRUCTION
// ═══════════════════════════════════════════════════════════════════════════

/// Either all four coordinates or none; two of four fails construction.
#[test]
fn partial_locations_never_construct() {
    let e = file_entity("src/a.ts", "eslint");
    for (line, column, end_line, end_column) in [
        (Some(1), None, None, None),
        (Some(1), Some(1), Some(1), None),
        (None, Some(1), None, Some(1)),
    ] {
        let err = IssueBuilder::new(&e, AnalysisCategory::StaticQuality, "eslint")
            .title("x")
            .location_parts(line, column, end_line, end_column)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::PartialLocation { .. }));
    }
}

#[test]
fn correlation_key_always_present() {
    let e = file_entity("src/a.ts", "eslint");
    let with_location = IssueBuilder::new(&e, AnalysisCategory::StaticQuality, "eslint")
        .title("unused variable")
        .location_parts(Some(10), Some(4), Some(10), Some(4))
        .build()
        .unwrap();
    let without = IssueBuilder::new(&e, AnalysisCategory::StaticQuality, "eslint")
        .title("file-level finding")
        .build()
        .unwrap();

    assert_eq!(with_location.correlation_key.len(), 16);
    assert_eq!(without.correlation_key.len(), 16);
    assert_ne!(with_location.correlation_key, without.correlation_key);
}

// ═══════════════════════════════════════════════════════════════════════════
// SEVERITY RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════

/// Unknown tokens map to info, never to a missing value.
#[test]
fn unknown_severity_token_maps_to_info() {
    assert_eq!(SeverityMapper::resolve(Some("bogus"), None, &[]), Severity::Info);
    assert_eq!(SeverityMapper::resolve(None, None, &[]), Severity::Info);
}

#[test]
fn moderate_unifies_to_medium() {
    assert_eq!(Severity::parse_token("moderate"), Some(Severity::Medium));
    assert_eq!(Severity::parse_token("medium"), Some(Severity::Medium));
}

#[test]
fn cvss_ladder() {
    assert_eq!(Severity::from_cvss(9.3), Severity::Critical);
    assert_eq!(Severity::from_cvss(7.0), Severity::High);
    assert_eq!(Severity::from_cvss(5.1), Severity::Medium);
    assert_eq!(Severity::from_cvss(0.1), Severity::Low);
    assert_eq!(Severity::from_cvss(0.0), Severity::Info);
}

/// A CVE alias floors an otherwise-unknown severity at medium.
#[test]
fn cve_alias_floors_at_medium() {
    let aliases = vec!["CVE-2023-1234".to_string()];
    assert_eq!(SeverityMapper::resolve(None, None, &aliases), Severity::Medium);
    // But never lowers an established level.
    assert_eq!(
        SeverityMapper::resolve(Some("critical"), None, &aliases),
        Severity::Critical
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// RESULT CONSTRUCTION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn result_requires_known_entities() {
    let e = file_entity("src/a.py", "pylint");
    let orphan = file_entity("src/b.py", "pylint");
    let issue = IssueBuilder::new(&orphan, AnalysisCategory::StaticQuality, "pylint")
        .title("x")
        .build()
        .unwrap();

    let err = UnifiedResult::build(
        "pylint",
        AnalysisCategory::StaticQuality,
        "/p",
        vec![e],
        vec![issue],
        RunMetadata::now(),
        1,
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownEntity { .. }));
}

/// Determinism equality ignores timestamps: two results built from the same
/// pieces compare equal after zeroing `timestamp_ms`.
#[test]
fn results_equal_modulo_timestamp() {
    let build = || {
        let e = file_entity("src/a.py", "pylint");
        let issue = IssueBuilder::new(&e, AnalysisCategory::StaticQuality, "pylint")
            .severity(Severity::Low)
            .title("bad name")
            .rule_id("C0103")
            .metadata(BTreeMap::new())
            .hints(CorrelationHints::with_patterns(&["lint"]))
            .build()
            .unwrap();
        UnifiedResult::build(
            "pylint",
            AnalysisCategory::StaticQuality,
            "/p",
            vec![e],
            vec![issue],
            RunMetadata::now(),
            7,
        )
        .unwrap()
    };

    let mut a = build();
    let mut b = build();
    a.run.timestamp_ms = 0;
    b.run.timestamp_ms = 0;
    assert_eq!(a, b);
}
