//! Per-tool adapters: a driver invocation plus a pure mapper that turns one
//! tool's native output into a unified result.
//!
//! Mappers never perform I/O, never spawn processes, and never mutate their
//! inputs. The only raw-to-trusted crossing is through the schema builders.

use std::collections::BTreeMap;
use std::time::Duration;

use skyline_core::errors::MapError;
use skyline_core::model::{UnifiedEntity, UnifiedIssue};
use skyline_core::taxonomy::AnalysisCategory;
use skyline_core::canonical::PathCanonicalizer;

use crate::orchestrator::detect::ProjectIndicators;

pub mod cbmc;
pub mod eslint;
pub mod manifests;
pub mod mypy;
pub mod npm_audit;
pub mod osv_scanner;
pub mod pylint;
pub mod registry;

pub use registry::{create_default_registry, AdapterRegistry};

/// Raw output of one finished, exit-code-clean tool run.
#[derive(Debug, Clone)]
pub struct RawRun {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Everything a mapper may consult. No filesystem handles — the indicators
/// were observed by the orchestrator before the run.
#[derive(Debug, Clone)]
pub struct MapContext {
    /// Absolute, normalized project path.
    pub project_path: String,
    pub canon: PathCanonicalizer,
    pub indicators: ProjectIndicators,
    pub tool_version: Option<String>,
}

/// A mapper's output, before the orchestrator attaches run metadata and
/// builds the final `UnifiedResult`.
#[derive(Debug, Default)]
pub struct Mapped {
    pub entities: Vec<UnifiedEntity>,
    pub issues: Vec<UnifiedIssue>,
    /// Tool-level extras for the result's run metadata (e.g. pylint rating).
    pub run_extra: BTreeMap<String, serde_json::Value>,
}

/// One supported external tool.
pub trait ToolAdapter: Send + Sync {
    /// Stable tool name used in entities, issues, and ordering.
    fn name(&self) -> &'static str;

    /// Executable to spawn. Defaults to the tool name.
    fn executable(&self) -> &'static str {
        self.name()
    }

    /// The single category every issue from this adapter carries.
    fn category(&self) -> AnalysisCategory;

    /// Argv for the short availability probe.
    fn probe_args(&self) -> Vec<String> {
        vec!["--version".to_string()]
    }

    /// Argv for the real run, relative to the project working directory.
    fn run_args(&self, ctx: &MapContext) -> Vec<String>;

    /// Exit codes that mean "finished cleanly, possibly with findings".
    fn clean_exit_codes(&self) -> &'static [i32] {
        &[0]
    }

    /// Whether an exit code counts as a clean run. Override for tools with
    /// bitmask exit codes.
    fn is_clean_exit(&self, code: i32) -> bool {
        self.clean_exit_codes().contains(&code)
    }

    /// Safe environment additions beyond PATH/HOME.
    fn env_additions(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Hard deadline for the real run.
    fn timeout(&self) -> Duration {
        Duration::from_secs(120)
    }

    /// Whether this adapter applies to a project with these indicators.
    fn applies_to(&self, indicators: &ProjectIndicators) -> bool;

    /// Metadata fields the validator requires on every issue.
    fn required_metadata(&self) -> &'static [&'static str] {
        &[]
    }

    /// Pure mapping from raw tool output to unified records.
    fn map(&self, raw: &RawRun, ctx: &MapContext) -> Result<Mapped, MapError>;
}

/// First line of a probe's stdout, used as the tool version string.
pub fn version_from_probe(stdout: &str) -> Option<String> {
    let line = stdout.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
