//! npm audit adapter: `npm audit --json`.
//!
//! The audit document is a `vulnerabilities` map keyed by package name. A
//! record's `via` array mixes advisory objects with plain package-name
//! strings (transitive links); one issue is emitted per advisory object,
//! with a single general issue as fallback when a record has a severity but
//! no advisory objects.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use skyline_core::canonical::package_path;
use skyline_core::errors::MapError;
use skyline_core::model::{CorrelationHints, EntityKind, IssueBuilder, UnifiedEntity};
use skyline_core::taxonomy::{AnalysisCategory, Severity, SeverityMapper};

use crate::orchestrator::detect::ProjectIndicators;

use super::{MapContext, Mapped, RawRun, ToolAdapter};

pub struct NpmAuditAdapter;

#[derive(Debug, Deserialize)]
struct AuditReport {
    #[serde(default)]
    vulnerabilities: BTreeMap<String, AuditRecord>,
}

#[derive(Debug, Deserialize)]
struct AuditRecord {
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    via: Vec<Value>,
    #[serde(default)]
    range: Option<String>,
    #[serde(default, rename = "isDirect")]
    is_direct: Option<bool>,
    #[serde(default, rename = "fixAvailable")]
    fix_available: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Advisory {
    #[serde(default)]
    source: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    cwe: Vec<String>,
    #[serde(default)]
    cvss: Option<Cvss>,
    #[serde(default)]
    range: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Cvss {
    #[serde(default)]
    score: Option<f64>,
}

impl ToolAdapter for NpmAuditAdapter {
    fn name(&self) -> &'static str {
        "npm-audit"
    }

    fn executable(&self) -> &'static str {
        "npm"
    }

    fn category(&self) -> AnalysisCategory {
        AnalysisCategory::DependencySecurity
    }

    fn run_args(&self, _ctx: &MapContext) -> Vec<String> {
        vec!["audit".to_string(), "--json".to_string()]
    }

    // npm exits 1 when vulnerabilities are found.
    fn clean_exit_codes(&self) -> &'static [i32] {
        &[0, 1]
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(300)
    }

    fn applies_to(&self, indicators: &ProjectIndicators) -> bool {
        indicators.has_package_json
    }

    fn required_metadata(&self) -> &'static [&'static str] {
        &["package_name"]
    }

    fn map(&self, raw: &RawRun, ctx: &MapContext) -> Result<Mapped, MapError> {
        let report: AuditReport = serde_json::from_str(&raw.stdout)
            .map_err(|e| MapError::parse(self.name(), e.to_string()))?;

        let mut mapped = Mapped::default();

        let manifest = UnifiedEntity::build(
            EntityKind::Manifest,
            "package.json",
            "package.json",
            "package.json",
            self.name(),
            1.0,
        )
        .map_err(|e| MapError::parse(self.name(), e.to_string()))?;
        mapped.entities.push(manifest);

        if ctx.indicators.has_package_lock {
            if let Ok(lockfile) = UnifiedEntity::build(
                EntityKind::Lockfile,
                "package-lock.json",
                "package-lock.json",
                "package-lock.json",
                self.name(),
                1.0,
            ) {
                mapped.entities.push(lockfile);
            }
        }

        let mut attempted = 0usize;
        let mut dropped = 0usize;

        for (package, record) in &report.vulnerabilities {
            attempted += 1;
            match self.map_record(package, record, ctx) {
                Ok((entity, issues)) => {
                    mapped.entities.push(entity);
                    mapped.issues.extend(issues);
                }
                Err(e) => {
                    dropped += 1;
                    tracing::warn!(package = %package, error = %e, "malformed audit record dropped");
                }
            }
        }

        if attempted > 0 && dropped == attempted {
            return Err(MapError::parse(
                self.name(),
                format!("all {attempted} vulnerability records were malformed"),
            ));
        }
        if dropped > 0 {
            mapped
                .run_extra
                .insert("dropped_records".to_string(), Value::from(dropped));
        }

        Ok(mapped)
    }
}

impl NpmAuditAdapter {
    fn map_record(
        &self,
        package: &str,
        record: &AuditRecord,
        _ctx: &MapContext,
    ) -> Result<(UnifiedEntity, Vec<skyline_core::model::UnifiedIssue>), MapError> {
        let canonical = package_path("npm", package);
        let entity = UnifiedEntity::build(
            EntityKind::Package,
            package,
            &canonical,
            package,
            self.name(),
            1.0,
        )
        .map_err(|e| MapError::parse(self.name(), e.to_string()))?;

        let advisories: Vec<Advisory> = record
            .via
            .iter()
            .filter(|v| v.is_object())
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect();

        let mut issues = Vec::new();

        if advisories.is_empty() {
            // Fallback: a severity is known but no advisory detail came
            // through (fully transitive record).
            if let Some(severity) = record.severity.as_deref().and_then(Severity::parse_token) {
                let issue = IssueBuilder::new(&entity, self.category(), self.name())
                    .severity(severity)
                    .title(&format!("Known vulnerability in {package}"))
                    .description(&format!(
                        "npm audit reports a {severity} severity vulnerability in {package}"
                    ))
                    .rule_id("advisory")
                    .metadata(self.base_metadata(package, record))
                    .hints(CorrelationHints::with_patterns(&["security_vulnerability"]))
                    .build()
                    .map_err(|e| MapError::parse(self.name(), e.to_string()))?;
                issues.push(issue);
            }
            return Ok((entity, issues));
        }

        for (ordinal, advisory) in advisories.iter().enumerate() {
            let severity = SeverityMapper::resolve(
                advisory
                    .severity
                    .as_deref()
                    .or(record.severity.as_deref()),
                advisory.cvss.as_ref().and_then(|c| c.score),
                &[],
            );

            let title = advisory
                .title
                .clone()
                .unwrap_or_else(|| format!("Known vulnerability in {package}"));
            let rule_id = advisory
                .source
                .map(|s| s.to_string())
                .unwrap_or_else(|| "advisory".to_string());

            let mut metadata = self.base_metadata(package, record);
            if !advisory.cwe.is_empty() {
                metadata.insert("cwe".to_string(), Value::from(advisory.cwe.clone()));
            }
            if let Some(score) = advisory.cvss.as_ref().and_then(|c| c.score) {
                metadata.insert("cvss_score".to_string(), Value::from(score));
            }
            if let Some(url) = &advisory.url {
                metadata.insert("advisory_url".to_string(), Value::from(url.clone()));
            }
            if let Some(range) = advisory.range.as_ref().or(record.range.as_ref()) {
                metadata.insert("range".to_string(), Value::from(range.clone()));
            }

            let issue = IssueBuilder::new(&entity, self.category(), self.name())
                .severity(severity)
                .title(&title)
                .description(&format!("{title} affecting {package}"))
                .rule_id(&rule_id)
                .metadata(metadata)
                .hints(CorrelationHints::with_patterns(&["security_vulnerability"]))
                .ordinal(ordinal as u32)
                .build()
                .map_err(|e| MapError::parse(self.name(), e.to_string()))?;
            issues.push(issue);
        }

        Ok((entity, issues))
    }

    fn base_metadata(&self, package: &str, record: &AuditRecord) -> BTreeMap<String, Value> {
        let mut metadata = BTreeMap::new();
        metadata.insert("package_name".to_string(), Value::from(package));
        metadata.insert("ecosystem".to_string(), Value::from("npm"));
        if let Some(native) = &record.severity {
            metadata.insert("native_severity".to_string(), Value::from(native.clone()));
        }
        if let Some(range) = &record.range {
            metadata.insert("range".to_string(), Value::from(range.clone()));
        }
        if let Some(is_direct) = record.is_direct {
            metadata.insert("is_direct".to_string(), Value::from(is_direct));
        }
        if let Some(fix) = &record.fix_available {
            metadata.insert("fix_available".to_string(), fix.clone());
        }
        metadata
    }
}
