//! Orchestrator pipeline tests with stub adapters: selection, probing,
//! partial failure, cancellation, and validation wiring.

#![cfg(unix)]

use std::path::Path;

use skyline_analysis::adapters::{
    AdapterRegistry, MapContext, Mapped, RawRun, ToolAdapter,
};
use skyline_analysis::driver::CancellationToken;
use skyline_analysis::orchestrator::ProjectIndicators;
use skyline_analysis::{analyze, Analyzer, AnalyzerContext};
use skyline_core::config::AnalyzerConfig;
use skyline_core::errors::{MapError, OrchestratorError};
use skyline_core::model::{EntityKind, IssueBuilder, UnifiedEntity};
use skyline_core::taxonomy::{AnalysisCategory, Severity};

// ─── Helpers ───────────────────────────────────────────────────────────────

const TRUE_BIN: &str = "/bin/true";
const MISSING_BIN: &str = "/skyline-no-such-tool";

fn host_has_true() -> bool {
    Path::new(TRUE_BIN).exists()
}

/// Route pipeline warnings through the captured test writer.
fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

fn project() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

fn analyzer_with(dir: &Path, registry: AdapterRegistry) -> Analyzer {
    let ctx = AnalyzerContext::new(dir, AnalyzerConfig::default()).unwrap();
    Analyzer::with_registry(ctx, registry)
}

fn stub_mapped(tool: &str, with_metadata: bool) -> Result<Mapped, MapError> {
    let entity = UnifiedEntity::build(
        EntityKind::File,
        "app.py",
        "src/app.py",
        "src/app.py",
        tool,
        1.0,
    )
    .unwrap();
    let mut builder = IssueBuilder::new(&entity, AnalysisCategory::StaticQuality, tool)
        .severity(Severity::Low)
        .title("stub finding")
        .rule_id("S001")
        .location_parts(Some(3), Some(1), Some(3), Some(1));
    if with_metadata {
        builder = builder.metadata_value("probe_kind", serde_json::json!("stub"));
    }
    let issue = builder.build().unwrap();
    Ok(Mapped {
        entities: vec![entity],
        issues: vec![issue],
        run_extra: Default::default(),
    })
}

/// Always-applicable adapter backed by `/bin/true`; emits one file entity
/// with one low-severity issue regardless of tool output.
struct StubAdapter;

impl ToolAdapter for StubAdapter {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn executable(&self) -> &'static str {
        TRUE_BIN
    }

    fn category(&self) -> AnalysisCategory {
        AnalysisCategory::StaticQuality
    }

    fn run_args(&self, _ctx: &MapContext) -> Vec<String> {
        Vec::new()
    }

    fn applies_to(&self, _indicators: &ProjectIndicators) -> bool {
        true
    }

    fn map(&self, _raw: &RawRun, _ctx: &MapContext) -> Result<Mapped, MapError> {
        stub_mapped("stub", true)
    }
}

/// Like `StubAdapter`, but its executable does not exist on any host.
struct UnavailableAdapter;

impl ToolAdapter for UnavailableAdapter {
    fn name(&self) -> &'static str {
        "ghost"
    }

    fn executable(&self) -> &'static str {
        MISSING_BIN
    }

    fn category(&self) -> AnalysisCategory {
        AnalysisCategory::TypeChecking
    }

    fn run_args(&self, _ctx: &MapContext) -> Vec<String> {
        Vec::new()
    }

    fn applies_to(&self, _indicators: &ProjectIndicators) -> bool {
        true
    }

    fn map(&self, _raw: &RawRun, _ctx: &MapContext) -> Result<Mapped, MapError> {
        Ok(Mapped::default())
    }
}

/// Declares required metadata that its issues never carry, so the validator
/// must drop every issue it emits.
struct UndeclaredMetadataAdapter;

impl ToolAdapter for UndeclaredMetadataAdapter {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn executable(&self) -> &'static str {
        TRUE_BIN
    }

    fn category(&self) -> AnalysisCategory {
        AnalysisCategory::StaticQuality
    }

    fn run_args(&self, _ctx: &MapContext) -> Vec<String> {
        Vec::new()
    }

    fn applies_to(&self, _indicators: &ProjectIndicators) -> bool {
        true
    }

    fn required_metadata(&self) -> &'static [&'static str] {
        &["verification_type"]
    }

    fn map(&self, _raw: &RawRun, _ctx: &MapContext) -> Result<Mapped, MapError> {
        stub_mapped("strict", false)
    }
}

/// Registered under the ecosystem scanner's name but backed by a missing
/// binary, so dependency audits deterministically hit the skip path.
struct MissingScannerAdapter;

impl ToolAdapter for MissingScannerAdapter {
    fn name(&self) -> &'static str {
        "osv-scanner"
    }

    fn executable(&self) -> &'static str {
        MISSING_BIN
    }

    fn category(&self) -> AnalysisCategory {
        AnalysisCategory::DependencySecurity
    }

    fn run_args(&self, _ctx: &MapContext) -> Vec<String> {
        Vec::new()
    }

    fn applies_to(&self, _indicators: &ProjectIndicators) -> bool {
        true
    }

    fn map(&self, _raw: &RawRun, _ctx: &MapContext) -> Result<Mapped, MapError> {
        Ok(Mapped::default())
    }
}

/// Parser that panics; the orchestrator must contain it to one result.
struct PanickingAdapter;

impl ToolAdapter for PanickingAdapter {
    fn name(&self) -> &'static str {
        "volatile"
    }

    fn executable(&self) -> &'static str {
        TRUE_BIN
    }

    fn category(&self) -> AnalysisCategory {
        AnalysisCategory::StaticQuality
    }

    fn run_args(&self, _ctx: &MapContext) -> Vec<String> {
        Vec::new()
    }

    fn applies_to(&self, _indicators: &ProjectIndicators) -> bool {
        true
    }

    fn map(&self, _raw: &RawRun, _ctx: &MapContext) -> Result<Mapped, MapError> {
        panic!("malformed output")
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SELECTION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn empty_project_selects_nothing() {
    let dir = project();
    let results = analyze(dir.path(), None, AnalyzerConfig::default()).unwrap();
    assert!(results.is_empty());
}

#[test]
fn unknown_tool_name_yields_no_results() {
    init_tracing();
    let dir = project();
    let results = analyze(dir.path(), Some(&["no-such-tool"]), AnalyzerConfig::default()).unwrap();
    assert!(results.is_empty());
}

#[test]
fn missing_project_root_is_rejected() {
    let err = analyze(
        Path::new("/skyline-no-such-project"),
        None,
        AnalyzerConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, OrchestratorError::ProjectRootInvalid { .. }));
}

#[test]
fn disabled_tools_are_excluded_even_when_named() {
    if !host_has_true() {
        return;
    }
    let dir = project();
    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(StubAdapter));

    let ctx = AnalyzerContext::new(
        dir.path(),
        AnalyzerConfig {
            disabled_tools: vec!["stub".to_string()],
            ..Default::default()
        },
    )
    .unwrap();
    let analyzer = Analyzer::with_registry(ctx, registry);

    let results = analyzer
        .analyze(Some(&["stub"]), &CancellationToken::new())
        .unwrap();
    assert!(results.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// FULL LOOP
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn stub_adapter_end_to_end() {
    if !host_has_true() {
        return;
    }
    let dir = project();
    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(StubAdapter));
    let analyzer = analyzer_with(dir.path(), registry);

    let results = analyzer.analyze(None, &CancellationToken::new()).unwrap();
    assert_eq!(results.len(), 1);

    let result = &results[0];
    assert_eq!(result.tool, "stub");
    assert!(result.success());
    assert!(!result.run.skipped);
    assert_eq!(result.entities.len(), 1);
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].entity_id, result.entities[0].id);
    assert_eq!(result.run.extra.get("exit_code"), Some(&serde_json::json!(0)));
    // The validator stamps readiness on every clean result.
    assert!(result.run.extra.contains_key("correlation_readiness_pct"));
}

#[test]
fn unavailable_tool_is_skipped_not_failed() {
    let dir = project();
    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(UnavailableAdapter));
    let analyzer = analyzer_with(dir.path(), registry);

    let results = analyzer.analyze(None, &CancellationToken::new()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].tool, "ghost");
    assert!(results[0].run.skipped);
    assert!(results[0].run.error.is_some());
    assert!(results[0].issues.is_empty());
}

#[test]
fn one_adapter_failing_never_hides_the_others() {
    init_tracing();
    if !host_has_true() {
        return;
    }
    let dir = project();
    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(StubAdapter));
    registry.register(Box::new(UnavailableAdapter));
    registry.register(Box::new(PanickingAdapter));
    let analyzer = analyzer_with(dir.path(), registry);

    let results = analyzer.analyze(None, &CancellationToken::new()).unwrap();
    assert_eq!(results.len(), 3);

    let by_tool = |name: &str| results.iter().find(|r| r.tool == name).unwrap();
    assert!(by_tool("stub").success());
    assert!(by_tool("ghost").run.skipped);

    let volatile = by_tool("volatile");
    assert!(!volatile.success());
    assert_eq!(
        volatile.run.error.as_deref(),
        Some("parser panicked on tool output")
    );
}

#[test]
fn results_are_ordered_by_tool_name() {
    if !host_has_true() {
        return;
    }
    let dir = project();
    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(StubAdapter));
    registry.register(Box::new(UnavailableAdapter));
    let analyzer = analyzer_with(dir.path(), registry);

    let results = analyzer.analyze(None, &CancellationToken::new()).unwrap();
    let tools: Vec<&str> = results.iter().map(|r| r.tool.as_str()).collect();
    assert_eq!(tools, vec!["ghost", "stub"]);
}

// ═══════════════════════════════════════════════════════════════════════════
// CANCELLATION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn pre_cancelled_token_marks_every_result_cancelled() {
    let dir = project();
    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(StubAdapter));
    registry.register(Box::new(UnavailableAdapter));
    let analyzer = analyzer_with(dir.path(), registry);

    let token = CancellationToken::new();
    token.cancel();
    let results = analyzer.analyze(None, &token).unwrap();
    assert_eq!(results.len(), 2);
    for result in &results {
        assert!(result.run.cancelled);
        assert!(result.issues.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DEPENDENCY AUDIT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn unsupported_ecosystem_is_rejected() {
    let dir = project();
    let ctx = AnalyzerContext::new(dir.path(), AnalyzerConfig::default()).unwrap();
    let analyzer = Analyzer::new(ctx);

    let err = analyzer
        .audit_dependency("nuget", "Newtonsoft.Json", Some("12.0.1"), &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Internal { .. }));
}

#[test]
fn audit_without_scanner_is_skipped_and_scratch_is_removed() {
    let dir = project();
    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(MissingScannerAdapter));
    let analyzer = analyzer_with(dir.path(), registry);

    let before = skyline_analysis::driver::scratch::registered_count();
    let result = analyzer
        .audit_dependency("npm", "lodash", Some("4.17.20"), &CancellationToken::new())
        .unwrap();

    // The probe fails on the missing binary, so the run is skipped, never
    // errored, and the scratch manifest directory is gone afterwards.
    assert_eq!(result.tool, "osv-scanner");
    assert!(result.run.skipped);
    assert!(result.issues.is_empty());
    assert_eq!(skyline_analysis::driver::scratch::registered_count(), before);
}

// ═══════════════════════════════════════════════════════════════════════════
// VALIDATION WIRING
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn validator_drops_issues_missing_required_metadata() {
    if !host_has_true() {
        return;
    }
    let dir = project();
    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(UndeclaredMetadataAdapter));
    let analyzer = analyzer_with(dir.path(), registry);

    let results = analyzer.analyze(None, &CancellationToken::new()).unwrap();
    assert_eq!(results.len(), 1);

    let result = &results[0];
    assert!(result.success());
    assert!(result.issues.is_empty());

    let validation = result.run.extra.get("validation").unwrap();
    let records = validation.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["rule"], "missing_metadata");
}
