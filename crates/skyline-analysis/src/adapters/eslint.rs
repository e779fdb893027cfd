//! ESLint adapter: `eslint --format json`.
//!
//! Output is an array of per-file records, each with a `messages` array.
//! Native severity is numeric: 2 = error, 1 = warning.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use skyline_core::errors::MapError;
use skyline_core::model::{CorrelationHints, EntityKind, IssueBuilder, UnifiedEntity};
use skyline_core::taxonomy::{AnalysisCategory, Severity};

use crate::orchestrator::detect::ProjectIndicators;

use super::{MapContext, Mapped, RawRun, ToolAdapter};

pub struct EslintAdapter;

#[derive(Debug, Deserialize)]
struct EslintFile {
    #[serde(default, rename = "filePath")]
    file_path: String,
    #[serde(default)]
    messages: Vec<EslintMessage>,
}

#[derive(Debug, Deserialize)]
struct EslintMessage {
    #[serde(default, rename = "ruleId")]
    rule_id: Option<String>,
    #[serde(default)]
    severity: u8,
    #[serde(default)]
    message: String,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    column: Option<u32>,
    #[serde(default, rename = "endLine")]
    end_line: Option<u32>,
    #[serde(default, rename = "endColumn")]
    end_column: Option<u32>,
}

impl ToolAdapter for EslintAdapter {
    fn name(&self) -> &'static str {
        "eslint"
    }

    fn category(&self) -> AnalysisCategory {
        AnalysisCategory::StaticQuality
    }

    fn run_args(&self, _ctx: &MapContext) -> Vec<String> {
        vec!["--format".to_string(), "json".to_string(), ".".to_string()]
    }

    // eslint exits 1 when lint problems are found.
    fn clean_exit_codes(&self) -> &'static [i32] {
        &[0, 1]
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(300)
    }

    fn applies_to(&self, indicators: &ProjectIndicators) -> bool {
        indicators.has_package_json || indicators.has_language("typescript")
    }

    fn map(&self, raw: &RawRun, ctx: &MapContext) -> Result<Mapped, MapError> {
        let files: Vec<EslintFile> = serde_json::from_str(&raw.stdout)
            .map_err(|e| MapError::parse(self.name(), e.to_string()))?;

        let mut mapped = Mapped::default();

        for file in &files {
            if file.messages.is_empty() {
                continue;
            }
            if file.file_path.is_empty() {
                tracing::warn!(tool = self.name(), "file record without path dropped");
                continue;
            }

            let canonical = ctx.canon.normalize(&file.file_path);
            let name = canonical.rsplit('/').next().unwrap_or(&canonical);
            let entity = UnifiedEntity::build(
                EntityKind::File,
                name,
                &canonical,
                &file.file_path,
                self.name(),
                1.0,
            )
            .map_err(|e| MapError::parse(self.name(), e.to_string()))?;

            for (ordinal, msg) in file.messages.iter().enumerate() {
                if msg.message.is_empty() {
                    tracing::warn!(tool = self.name(), file = %canonical, "empty message dropped");
                    continue;
                }

                // 2 = error, 1 = warning; unified the same way the pylint
                // and mypy mappers treat those tokens.
                let severity = match msg.severity {
                    2 => Severity::High,
                    1 => Severity::Medium,
                    _ => Severity::Info,
                };
                let rule_id = msg.rule_id.as_deref().unwrap_or("eslint");

                // ESLint locations are 1-based; complete end = start when
                // the rule reports no span.
                let (line, column) = match (msg.line, msg.column) {
                    (Some(l), Some(c)) if l >= 1 && c >= 1 => (Some(l), Some(c)),
                    _ => (None, None),
                };
                let end_line = msg.end_line.filter(|_| line.is_some()).or(line);
                let end_column = msg.end_column.filter(|_| column.is_some()).or(column);

                let mut metadata = BTreeMap::new();
                metadata.insert(
                    "native_severity".to_string(),
                    Value::from(msg.severity),
                );

                let built = IssueBuilder::new(&entity, self.category(), self.name())
                    .severity(severity)
                    .title(&msg.message)
                    .description(&format!("{} ({rule_id})", msg.message))
                    .rule_id(rule_id)
                    .location_parts(line, column, end_line, end_column)
                    .metadata(metadata)
                    .hints(hints_for(rule_id))
                    .ordinal(ordinal as u32)
                    .build();
                match built {
                    Ok(issue) => mapped.issues.push(issue),
                    Err(e) => {
                        tracing::warn!(tool = self.name(), file = %canonical, rule = %rule_id, error = %e, "malformed message dropped");
                    }
                }
            }

            mapped.entities.push(entity);
        }

        mapped
            .entities
            .sort_by(|a, b| a.canonical_path.cmp(&b.canonical_path));

        Ok(mapped)
    }
}

fn hints_for(rule_id: &str) -> CorrelationHints {
    if rule_id.contains("unused") || rule_id.contains("no-unreachable") {
        CorrelationHints::with_patterns(&["dead_code"])
    } else if rule_id.contains("complexity") {
        CorrelationHints::with_patterns(&["complexity_hotspot"])
    } else if rule_id.starts_with("security/") {
        CorrelationHints::with_patterns(&["security_vulnerability"])
    } else {
        CorrelationHints::with_patterns(&["lint"])
    }
}
