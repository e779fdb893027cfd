//! pylint adapter: `pylint --output-format=json`.
//!
//! Diagnostics arrive as a JSON array. The trailing "rated at X/10" line
//! only appears in text reports; when present on either stream it is
//! preserved in the run metadata.

use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use skyline_core::errors::MapError;
use skyline_core::model::{CorrelationHints, EntityKind, IssueBuilder, UnifiedEntity};
use skyline_core::taxonomy::{AnalysisCategory, Severity};
use skyline_core::FxHashMap;

use crate::orchestrator::detect::ProjectIndicators;

use super::{MapContext, Mapped, RawRun, ToolAdapter};

pub struct PylintAdapter;

#[derive(Debug, Deserialize)]
struct PylintDiagnostic {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default, rename = "message-id")]
    message_id: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    column: Option<u32>,
    #[serde(default, rename = "endLine")]
    end_line: Option<u32>,
    #[serde(default, rename = "endColumn")]
    end_column: Option<u32>,
}

fn rating_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"rated at (-?\d+(?:\.\d+)?)/10").expect("rating regex is valid")
    })
}

impl ToolAdapter for PylintAdapter {
    fn name(&self) -> &'static str {
        "pylint"
    }

    fn category(&self) -> AnalysisCategory {
        AnalysisCategory::StaticQuality
    }

    fn run_args(&self, _ctx: &MapContext) -> Vec<String> {
        vec![
            "--output-format=json".to_string(),
            "--recursive=y".to_string(),
            ".".to_string(),
        ]
    }

    // pylint's exit code is a bitmask: 1=fatal, 2=error, 4=warning,
    // 8=refactor, 16=convention, 32=usage error.
    fn is_clean_exit(&self, code: i32) -> bool {
        (0..=30).contains(&code) && code & 1 == 0
    }

    fn clean_exit_codes(&self) -> &'static [i32] {
        &[0, 2, 4, 8, 16]
    }

    fn env_additions(&self) -> Vec<(String, String)> {
        vec![
            ("PYTHONDONTWRITEBYTECODE".to_string(), "1".to_string()),
            ("PYTHONPATH".to_string(), String::new()),
        ]
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(300)
    }

    fn applies_to(&self, indicators: &ProjectIndicators) -> bool {
        indicators.has_language("python")
    }

    fn map(&self, raw: &RawRun, ctx: &MapContext) -> Result<Mapped, MapError> {
        let diagnostics: Vec<PylintDiagnostic> = serde_json::from_str(&raw.stdout)
            .map_err(|e| MapError::parse(self.name(), e.to_string()))?;

        let mut mapped = Mapped::default();
        let mut entities: FxHashMap<String, UnifiedEntity> = FxHashMap::default();
        let mut ordinals: FxHashMap<String, u32> = FxHashMap::default();

        let mut sorted: Vec<&PylintDiagnostic> = diagnostics.iter().collect();
        sorted.sort_by(|a, b| {
            (&a.path, a.line, &a.message_id).cmp(&(&b.path, b.line, &b.message_id))
        });

        for diag in sorted {
            if diag.path.is_empty() || diag.message.is_empty() {
                tracing::warn!(tool = self.name(), "diagnostic without path or message dropped");
                continue;
            }

            let canonical = ctx.canon.normalize(&diag.path);
            let entity = match entities.get(&canonical) {
                Some(e) => e.clone(),
                None => {
                    let name = canonical.rsplit('/').next().unwrap_or(&canonical);
                    let entity = UnifiedEntity::build(
                        EntityKind::File,
                        name,
                        &canonical,
                        &diag.path,
                        self.name(),
                        1.0,
                    )
                    .map_err(|e| MapError::parse(self.name(), e.to_string()))?;
                    entities.insert(canonical.clone(), entity.clone());
                    entity
                }
            };

            let severity = match diag.kind.as_str() {
                "fatal" | "error" => Severity::High,
                "warning" => Severity::Medium,
                "convention" | "refactor" => Severity::Low,
                _ => Severity::Info,
            };

            // pylint reports 0-based columns; shift to the 1-based contract.
            let (line, column) = match (diag.line, diag.column) {
                (Some(l), Some(c)) if l >= 1 => (Some(l), Some(c + 1)),
                _ => (None, None),
            };
            let end_line = diag.end_line.filter(|_| line.is_some()).or(line);
            let end_column = diag
                .end_column
                .map(|c| c + 1)
                .filter(|_| column.is_some())
                .or(column);

            let ordinal = ordinals.entry(entity.id.clone()).or_insert(0);
            let mut metadata = BTreeMap::new();
            metadata.insert("symbol".to_string(), Value::from(diag.symbol.clone()));
            metadata.insert(
                "native_severity".to_string(),
                Value::from(diag.kind.clone()),
            );
            if diag.symbol == "cyclic-import" {
                // "Cyclic import (a -> b -> a)" — the chain is the payload
                // the correlation engine and validator read.
                let chain: Vec<&str> = diag
                    .message
                    .trim_end_matches(')')
                    .rsplit('(')
                    .next()
                    .map(|inner| inner.split(" -> ").collect())
                    .unwrap_or_default();
                metadata.insert("dependency_chain".to_string(), Value::from(chain));
            }

            let built = IssueBuilder::new(&entity, self.category(), self.name())
                .severity(severity)
                .title(&diag.message)
                .description(&format!("{} ({})", diag.message, diag.symbol))
                .rule_id(&diag.message_id)
                .location_parts(line, column, end_line, end_column)
                .metadata(metadata)
                .hints(hints_for(&diag.symbol))
                .ordinal(*ordinal)
                .build();
            match built {
                Ok(issue) => {
                    *ordinal += 1;
                    mapped.issues.push(issue);
                }
                Err(e) => {
                    tracing::warn!(tool = self.name(), file = %canonical, rule = %diag.message_id, error = %e, "malformed diagnostic dropped");
                }
            }
        }

        let mut ordered: Vec<UnifiedEntity> = entities.into_values().collect();
        ordered.sort_by(|a, b| a.canonical_path.cmp(&b.canonical_path));
        mapped.entities = ordered;

        for stream in [&raw.stdout, &raw.stderr] {
            if let Some(caps) = rating_regex().captures(stream) {
                if let Ok(rating) = caps[1].parse::<f64>() {
                    mapped
                        .run_extra
                        .insert("pylint_rating".to_string(), Value::from(rating));
                }
                break;
            }
        }

        Ok(mapped)
    }
}

/// Cross-tool pattern tags for a pylint symbol.
fn hints_for(symbol: &str) -> CorrelationHints {
    if symbol.contains("unused") || symbol == "unreachable" {
        CorrelationHints::with_patterns(&["dead_code"])
    } else if symbol == "cyclic-import" {
        CorrelationHints::with_patterns(&["circular_dependency"])
    } else if symbol.starts_with("too-many") || symbol.contains("complex") {
        CorrelationHints::with_patterns(&["complexity_hotspot"])
    } else {
        CorrelationHints::with_patterns(&["lint"])
    }
}
