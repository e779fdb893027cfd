//! The analyzer orchestrator: detection, adapter selection, availability
//! probes, and the bounded parallel fan-out over tool runs.
//!
//! Partial-failure semantics throughout: one adapter failing, panicking, or
//! timing out never aborts the others. Every selected adapter contributes
//! exactly one result, possibly empty with an error or skipped marker.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::time::Duration;

use rayon::prelude::*;

use skyline_core::canonical::PathCanonicalizer;
use skyline_core::config::AnalyzerConfig;
use skyline_core::errors::{OrchestratorError, SkylineErrorCode};
use skyline_core::model::{RunMetadata, UnifiedResult};

use crate::adapters::{
    create_default_registry, manifests, version_from_probe, AdapterRegistry, MapContext, RawRun,
    ToolAdapter,
};
use crate::driver::{CancellationToken, CommandSpec, RunOptions, RunOutcome, ScratchDir};
use crate::validator::Validator;

use super::context::AnalyzerContext;
use super::detect::{detect_indicators, ProjectIndicators};

/// Output cap for availability probes; version banners are tiny.
const PROBE_OUTPUT_BYTES: usize = 64 * 1024;
/// Stderr excerpt length carried into error strings.
const STDERR_EXCERPT: usize = 400;

pub struct Analyzer {
    ctx: AnalyzerContext,
    registry: AdapterRegistry,
    validator: Validator,
}

impl Analyzer {
    pub fn new(ctx: AnalyzerContext) -> Self {
        Self::with_registry(ctx, create_default_registry())
    }

    pub fn with_registry(ctx: AnalyzerContext, registry: AdapterRegistry) -> Self {
        let validator = Validator::from_registry(&registry);
        Self {
            ctx,
            registry,
            validator,
        }
    }

    pub fn context(&self) -> &AnalyzerContext {
        &self.ctx
    }

    /// Run the selected tool set (or the auto-detected default set) and
    /// collect one result per adapter, deterministically ordered by
    /// (tool, first issue id).
    pub fn analyze(
        &self,
        tool_set: Option<&[&str]>,
        token: &CancellationToken,
    ) -> Result<Vec<UnifiedResult>, OrchestratorError> {
        let indicators = detect_indicators(self.ctx.project_root(), self.ctx.canon());
        let selected = self.select_adapters(tool_set, &indicators);

        if selected.is_empty() {
            return Ok(Vec::new());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.ctx.config().effective_concurrency())
            .build()
            .map_err(|e| OrchestratorError::Internal {
                message: format!("thread pool construction failed: {e}"),
            })?;

        let mut results: Vec<UnifiedResult> = pool.install(|| {
            selected
                .par_iter()
                .map(|adapter| self.run_adapter(*adapter, &indicators, token))
                .collect()
        });

        results.sort_by(|a, b| {
            (a.tool.as_str(), a.first_issue_id()).cmp(&(b.tool.as_str(), b.first_issue_id()))
        });
        Ok(results)
    }

    /// Explicit tool names win over detection; unknown or disabled names are
    /// dropped with a warning. Without a tool set, every enabled adapter that
    /// applies to the observed indicators runs.
    fn select_adapters(
        &self,
        tool_set: Option<&[&str]>,
        indicators: &ProjectIndicators,
    ) -> Vec<&dyn ToolAdapter> {
        let disabled = &self.ctx.config().disabled_tools;

        match tool_set {
            Some(names) => names
                .iter()
                .filter_map(|name| {
                    let found = self.registry.get(name);
                    if found.is_none() {
                        tracing::warn!(tool = %name, "unknown or disabled tool requested");
                    }
                    found
                })
                .filter(|a| !disabled.iter().any(|d| d == a.name()))
                .collect(),
            None => self
                .registry
                .iter_enabled()
                .filter(|a| !disabled.iter().any(|d| d == a.name()))
                .filter(|a| a.applies_to(indicators))
                .collect(),
        }
    }

    /// Audit one dependency coordinate in isolation: render a synthetic
    /// manifest into a scratch directory and run the ecosystem scanner
    /// against it. The scratch directory is removed on every exit path.
    pub fn audit_dependency(
        &self,
        ecosystem: &str,
        name: &str,
        version: Option<&str>,
        token: &CancellationToken,
    ) -> Result<UnifiedResult, OrchestratorError> {
        let (file_name, contents) =
            manifests::render(ecosystem, name, version).ok_or_else(|| {
                OrchestratorError::Internal {
                    message: format!("no synthetic manifest renderer for ecosystem `{ecosystem}`"),
                }
            })?;

        let adapter = self
            .registry
            .get("osv-scanner")
            .ok_or_else(|| OrchestratorError::Internal {
                message: "osv-scanner adapter is not registered".to_string(),
            })?;

        let scratch = ScratchDir::create().map_err(|e| OrchestratorError::Internal {
            message: format!("scratch dir creation failed: {e}"),
        })?;
        std::fs::write(scratch.path().join(file_name), contents).map_err(|e| {
            OrchestratorError::Internal {
                message: format!("synthetic manifest write failed: {e}"),
            }
        })?;

        let canon = PathCanonicalizer::new(scratch.path());
        let project_path = canon.root().to_string();
        let indicators = ProjectIndicators::default();
        Ok(self.run_adapter_at(
            adapter,
            &indicators,
            token,
            scratch.path(),
            &canon,
            &project_path,
        ))
    }

    /// One adapter end to end against the context's project root.
    fn run_adapter(
        &self,
        adapter: &dyn ToolAdapter,
        indicators: &ProjectIndicators,
        token: &CancellationToken,
    ) -> UnifiedResult {
        self.run_adapter_at(
            adapter,
            indicators,
            token,
            self.ctx.project_root(),
            self.ctx.canon(),
            self.ctx.project_path(),
        )
    }

    /// One adapter end to end: probe, run, exit-code check, map, build.
    /// Every failure path folds into an empty result for this tool.
    fn run_adapter_at(
        &self,
        adapter: &dyn ToolAdapter,
        indicators: &ProjectIndicators,
        token: &CancellationToken,
        root: &Path,
        canon: &PathCanonicalizer,
        project_path: &str,
    ) -> UnifiedResult {
        let tool = adapter.name();
        let category = adapter.category();

        let tool_version = match self.probe(adapter, token, root) {
            Probe::Available(version) => version,
            Probe::Unavailable(reason) => {
                tracing::debug!(tool = %tool, reason = %reason, "adapter skipped");
                return UnifiedResult::skipped(tool, category, project_path, &reason);
            }
            Probe::Cancelled => return self.cancelled_result(adapter, project_path),
        };

        if token.is_cancelled() {
            return self.cancelled_result(adapter, project_path);
        }

        let map_ctx = MapContext {
            project_path: project_path.to_string(),
            canon: canon.clone(),
            indicators: indicators.clone(),
            tool_version: tool_version.clone(),
        };

        let limits = &self.ctx.config().limits;
        let timeout = limits
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| adapter.timeout());
        let spec = CommandSpec {
            executable: adapter.executable().to_string(),
            args: adapter.run_args(&map_ctx),
            working_dir: root.to_path_buf(),
        };
        let opts = RunOptions {
            timeout,
            max_output_bytes: limits.effective_max_output_bytes(),
            env_additions: adapter.env_additions(),
        };

        let outcome = match self.ctx.kernel().run(&spec, &opts, token) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(tool = %tool, code = e.error_code(), error = %e, "tool run failed");
                let mut result = UnifiedResult::empty_with_error(
                    tool,
                    category,
                    project_path,
                    e.to_string(),
                    0,
                );
                result
                    .run
                    .extra
                    .insert("error_code".to_string(), e.error_code().into());
                result.run.tool_version = tool_version;
                return result;
            }
        };

        let duration_ms = outcome.duration.as_millis() as u64;
        if outcome.killed {
            return self.cancelled_result(adapter, project_path);
        }

        match outcome.exit_code {
            Some(code) if adapter.is_clean_exit(code) => {}
            Some(code) => {
                let excerpt = stderr_excerpt(&outcome);
                let mut result = UnifiedResult::empty_with_error(
                    tool,
                    category,
                    project_path,
                    format!("tool exited with code {code}: {excerpt}"),
                    duration_ms,
                );
                result.run.tool_version = tool_version;
                result.run.extra.insert("exit_code".to_string(), code.into());
                return result;
            }
            None => {
                let mut result = UnifiedResult::empty_with_error(
                    tool,
                    category,
                    project_path,
                    "tool terminated by signal",
                    duration_ms,
                );
                result.run.tool_version = tool_version;
                return result;
            }
        }

        let raw = RawRun {
            stdout: outcome.stdout_str(),
            stderr: outcome.stderr_str(),
            exit_code: outcome.exit_code,
        };

        // Mapper panics are contained to this adapter's result.
        let mapped = match catch_unwind(AssertUnwindSafe(|| adapter.map(&raw, &map_ctx))) {
            Ok(Ok(mapped)) => mapped,
            Ok(Err(e)) => {
                tracing::warn!(tool = %tool, error = %e, "mapper rejected tool output");
                let mut result = UnifiedResult::empty_with_error(
                    tool,
                    category,
                    project_path,
                    e.to_string(),
                    duration_ms,
                );
                result.run.tool_version = tool_version;
                return result;
            }
            Err(_) => {
                tracing::error!(tool = %tool, "mapper panicked");
                let mut result = UnifiedResult::empty_with_error(
                    tool,
                    category,
                    project_path,
                    "parser panicked on tool output",
                    duration_ms,
                );
                result.run.tool_version = tool_version;
                return result;
            }
        };

        let mut run = RunMetadata::now().with_tool_version(tool_version.clone());
        if let Some(code) = outcome.exit_code {
            run.extra.insert("exit_code".to_string(), code.into());
        }
        run.extra.extend(mapped.run_extra);

        match UnifiedResult::build(
            tool,
            category,
            project_path,
            mapped.entities,
            mapped.issues,
            run,
            duration_ms,
        ) {
            Ok(mut result) => {
                self.validator.validate_result(&mut result);
                result
            }
            Err(e) => {
                tracing::error!(tool = %tool, error = %e, "mapped output violated schema");
                let mut result = UnifiedResult::empty_with_error(
                    tool,
                    category,
                    project_path,
                    e.to_string(),
                    duration_ms,
                );
                result.run.tool_version = tool_version;
                result
            }
        }
    }

    /// Short version-print run. Any failure counts as unavailable.
    fn probe(&self, adapter: &dyn ToolAdapter, token: &CancellationToken, root: &Path) -> Probe {
        if token.is_cancelled() {
            return Probe::Cancelled;
        }

        let spec = CommandSpec {
            executable: adapter.executable().to_string(),
            args: adapter.probe_args(),
            working_dir: root.to_path_buf(),
        };
        let opts = RunOptions {
            timeout: Duration::from_millis(
                self.ctx.config().limits.effective_probe_timeout_ms(),
            ),
            max_output_bytes: PROBE_OUTPUT_BYTES,
            env_additions: Vec::new(),
        };

        match self.ctx.kernel().run(&spec, &opts, token) {
            Ok(outcome) if outcome.killed => Probe::Cancelled,
            Ok(outcome) => match outcome.exit_code {
                Some(0) => Probe::Available(version_from_probe(&outcome.stdout_str())),
                other => Probe::Unavailable(format!(
                    "version probe exited with {other:?}"
                )),
            },
            Err(skyline_core::errors::DriverError::Cancelled) => Probe::Cancelled,
            Err(e) => Probe::Unavailable(e.to_string()),
        }
    }

    fn cancelled_result(&self, adapter: &dyn ToolAdapter, project_path: &str) -> UnifiedResult {
        let mut run = RunMetadata::now();
        run.cancelled = true;
        UnifiedResult {
            tool: adapter.name().to_string(),
            category: adapter.category(),
            project_path: project_path.to_string(),
            entities: Vec::new(),
            issues: Vec::new(),
            run,
            duration_ms: 0,
        }
    }
}

enum Probe {
    Available(Option<String>),
    Unavailable(String),
    Cancelled,
}

fn stderr_excerpt(outcome: &RunOutcome) -> String {
    let text = outcome.stderr_str();
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_EXCERPT {
        trimmed.to_string()
    } else {
        let mut end = STDERR_EXCERPT;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        trimmed[..end].to_string()
    }
}

/// Convenience entry point: run the default adapter set over a project.
pub fn analyze(
    project_root: &Path,
    tool_set: Option<&[&str]>,
    config: AnalyzerConfig,
) -> Result<Vec<UnifiedResult>, OrchestratorError> {
    let ctx = AnalyzerContext::new(project_root, config)?;
    let analyzer = Analyzer::new(ctx);
    analyzer.analyze(tool_set, &CancellationToken::new())
}
