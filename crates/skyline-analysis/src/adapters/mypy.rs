//! mypy adapter: line-oriented text output.
//!
//! Format: `file:line:col: severity: message [code]`. Columns are requested
//! explicitly; lines that do not match the shape (summaries, blank lines)
//! are skipped without counting as malformed records.

use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;

use skyline_core::errors::MapError;
use skyline_core::model::{CorrelationHints, EntityKind, IssueBuilder, UnifiedEntity};
use skyline_core::taxonomy::{AnalysisCategory, Severity};
use skyline_core::FxHashMap;

use crate::orchestrator::detect::ProjectIndicators;

use super::{MapContext, Mapped, RawRun, ToolAdapter};

pub struct MypyAdapter;

fn diagnostic_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<file>[^:]+):(?P<line>\d+):(?:(?P<col>\d+):)?\s*(?P<sev>error|warning|note):\s*(?P<msg>.*?)(?:\s+\[(?P<code>[a-z0-9-]+)\])?$",
        )
        .expect("mypy diagnostic regex is valid")
    })
}

impl ToolAdapter for MypyAdapter {
    fn name(&self) -> &'static str {
        "mypy"
    }

    fn category(&self) -> AnalysisCategory {
        AnalysisCategory::TypeChecking
    }

    fn run_args(&self, _ctx: &MapContext) -> Vec<String> {
        vec![
            "--no-color-output".to_string(),
            "--no-error-summary".to_string(),
            "--show-column-numbers".to_string(),
            "--show-error-codes".to_string(),
            ".".to_string(),
        ]
    }

    // mypy exits 1 when type errors are found.
    fn clean_exit_codes(&self) -> &'static [i32] {
        &[0, 1]
    }

    fn env_additions(&self) -> Vec<(String, String)> {
        vec![
            ("PYTHONDONTWRITEBYTECODE".to_string(), "1".to_string()),
            ("PYTHONPATH".to_string(), String::new()),
            ("MYPYPATH".to_string(), String::new()),
        ]
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(300)
    }

    fn applies_to(&self, indicators: &ProjectIndicators) -> bool {
        indicators.has_language("python")
    }

    fn map(&self, raw: &RawRun, ctx: &MapContext) -> Result<Mapped, MapError> {
        let mut mapped = Mapped::default();
        let mut entities: FxHashMap<String, UnifiedEntity> = FxHashMap::default();
        let mut ordinals: FxHashMap<String, u32> = FxHashMap::default();

        for line in raw.stdout.lines() {
            let caps = match diagnostic_regex().captures(line.trim_end()) {
                Some(c) => c,
                None => continue,
            };

            let file = &caps["file"];
            let line_no: u32 = match caps["line"].parse() {
                Ok(n) if n >= 1 => n,
                _ => {
                    tracing::warn!(tool = self.name(), line = %line, "unparseable line number; dropped");
                    continue;
                }
            };
            let column: Option<u32> = caps.name("col").and_then(|c| c.as_str().parse().ok());

            let canonical = ctx.canon.normalize(file);
            let entity = match entities.get(&canonical) {
                Some(e) => e.clone(),
                None => {
                    let name = canonical.rsplit('/').next().unwrap_or(&canonical);
                    let entity = UnifiedEntity::build(
                        EntityKind::File,
                        name,
                        &canonical,
                        file,
                        self.name(),
                        1.0,
                    )
                    .map_err(|e| MapError::parse(self.name(), e.to_string()))?;
                    entities.insert(canonical.clone(), entity.clone());
                    entity
                }
            };

            let severity = match &caps["sev"] {
                "error" => Severity::High,
                "warning" => Severity::Medium,
                // Notes are attachments to a preceding error, not findings
                // of their own.
                _ => Severity::Info,
            };

            let code = caps.name("code").map(|c| c.as_str()).unwrap_or("misc");
            let message = caps["msg"].trim();

            // Only fully-located diagnostics carry a location (end = start).
            let (l, c) = match column {
                Some(col) if col >= 1 => (Some(line_no), Some(col)),
                _ => (None, None),
            };

            let mut metadata = BTreeMap::new();
            metadata.insert("native_severity".to_string(), Value::from(&caps["sev"]));
            metadata.insert("error_code".to_string(), Value::from(code));

            let ordinal = ordinals.entry(entity.id.clone()).or_insert(0);
            let built = IssueBuilder::new(&entity, self.category(), self.name())
                .severity(severity)
                .title(message)
                .description(&format!("mypy {}: {message}", &caps["sev"]))
                .rule_id(code)
                .location_parts(l, c, l, c)
                .metadata(metadata)
                .hints(hints_for(code))
                .ordinal(*ordinal)
                .build();
            match built {
                Ok(issue) => {
                    *ordinal += 1;
                    mapped.issues.push(issue);
                }
                Err(e) => {
                    tracing::warn!(tool = self.name(), file = %canonical, rule = %code, error = %e, "malformed diagnostic dropped");
                }
            }
        }

        // mypy imposes no stable order across files; sort by
        // (canonical path, line, rule id).
        let path_of: FxHashMap<String, String> = entities
            .values()
            .map(|e| (e.id.clone(), e.canonical_path.clone()))
            .collect();
        mapped.issues.sort_by(|a, b| {
            (path_of.get(&a.entity_id), a.location.map(|l| l.line), &a.rule_id)
                .cmp(&(path_of.get(&b.entity_id), b.location.map(|l| l.line), &b.rule_id))
        });

        let mut ordered: Vec<UnifiedEntity> = entities.into_values().collect();
        ordered.sort_by(|a, b| a.canonical_path.cmp(&b.canonical_path));
        mapped.entities = ordered;

        Ok(mapped)
    }
}

fn hints_for(code: &str) -> CorrelationHints {
    match code {
        "unreachable" | "unused-ignore" | "unused-awaitable" => {
            CorrelationHints::with_patterns(&["dead_code"])
        }
        _ => CorrelationHints::with_patterns(&["type_error"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_lines_parse() {
        let re = diagnostic_regex();
        let caps = re
            .captures("src/app.py:12:4: error: Incompatible return value  [misc]")
            .unwrap();
        assert_eq!(&caps["file"], "src/app.py");
        assert_eq!(&caps["line"], "12");
        assert_eq!(caps.name("col").unwrap().as_str(), "4");
        assert_eq!(&caps["sev"], "error");
        assert_eq!(caps.name("code").unwrap().as_str(), "misc");
    }

    #[test]
    fn summary_lines_ignored() {
        let re = diagnostic_regex();
        assert!(re.captures("Found 2 errors in 1 file (checked 3 source files)").is_none());
        assert!(re.captures("").is_none());
    }
}
