//! OSV scanner adapter: `osv-scanner --format json`.
//!
//! Output shape: `results[].packages[].vulnerabilities[]`. Each result names
//! the scanned manifest or lockfile in `source.path`, which becomes the
//! anchor entity actually observed on disk.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use skyline_core::canonical::package_path;
use skyline_core::errors::MapError;
use skyline_core::model::{CorrelationHints, EntityKind, IssueBuilder, UnifiedEntity};
use skyline_core::taxonomy::{AnalysisCategory, SeverityMapper};

use crate::orchestrator::detect::ProjectIndicators;

use super::{MapContext, Mapped, RawRun, ToolAdapter};

pub struct OsvScannerAdapter;

#[derive(Debug, Deserialize)]
struct OsvReport {
    #[serde(default)]
    results: Vec<OsvResult>,
}

#[derive(Debug, Deserialize)]
struct OsvResult {
    #[serde(default)]
    source: Option<OsvSource>,
    #[serde(default)]
    packages: Vec<OsvPackage>,
}

#[derive(Debug, Deserialize)]
struct OsvSource {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsvPackage {
    package: OsvCoordinate,
    #[serde(default)]
    vulnerabilities: Vec<OsvVulnerability>,
}

#[derive(Debug, Deserialize)]
struct OsvCoordinate {
    name: String,
    #[serde(default)]
    ecosystem: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsvVulnerability {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
    #[serde(default)]
    database_specific: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OsvSeverity {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    score: Option<Value>,
}

impl ToolAdapter for OsvScannerAdapter {
    fn name(&self) -> &'static str {
        "osv-scanner"
    }

    fn category(&self) -> AnalysisCategory {
        AnalysisCategory::DependencySecurity
    }

    fn run_args(&self, ctx: &MapContext) -> Vec<String> {
        vec![
            "--format".to_string(),
            "json".to_string(),
            "--recursive".to_string(),
            ctx.project_path.clone(),
        ]
    }

    // osv-scanner exits 1 when vulnerabilities are found.
    fn clean_exit_codes(&self) -> &'static [i32] {
        &[0, 1]
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(300)
    }

    fn applies_to(&self, indicators: &ProjectIndicators) -> bool {
        indicators.has_package_lock
            || indicators.has_cargo_toml
            || indicators.has_go_mod
            || indicators.has_requirements_txt
            || indicators.has_pipfile_lock
    }

    fn required_metadata(&self) -> &'static [&'static str] {
        &["package_name"]
    }

    fn map(&self, raw: &RawRun, ctx: &MapContext) -> Result<Mapped, MapError> {
        let report: OsvReport = serde_json::from_str(&raw.stdout)
            .map_err(|e| MapError::parse(self.name(), e.to_string()))?;

        let mut mapped = Mapped::default();
        let mut attempted = 0usize;
        let mut dropped = 0usize;

        for result in &report.results {
            if let Some(path) = result.source.as_ref().and_then(|s| s.path.as_deref()) {
                let canonical = ctx.canon.normalize(path);
                let kind = if canonical.ends_with(".lock")
                    || canonical.ends_with("package-lock.json")
                    || canonical.ends_with(".sum")
                {
                    EntityKind::Lockfile
                } else {
                    EntityKind::Manifest
                };
                let name = canonical.rsplit('/').next().unwrap_or(&canonical);
                if let Ok(entity) =
                    UnifiedEntity::build(kind, name, &canonical, path, self.name(), 1.0)
                {
                    mapped.entities.push(entity);
                }
            }

            for package in &result.packages {
                attempted += 1;
                match self.map_package(package) {
                    Ok((entity, issues)) => {
                        mapped.entities.push(entity);
                        mapped.issues.extend(issues);
                    }
                    Err(e) => {
                        dropped += 1;
                        tracing::warn!(
                            package = %package.package.name,
                            error = %e,
                            "malformed OSV package dropped"
                        );
                    }
                }
            }
        }

        if attempted > 0 && dropped == attempted {
            return Err(MapError::parse(
                self.name(),
                format!("all {attempted} package records were malformed"),
            ));
        }

        Ok(mapped)
    }
}

impl OsvScannerAdapter {
    fn map_package(
        &self,
        package: &OsvPackage,
    ) -> Result<(UnifiedEntity, Vec<skyline_core::model::UnifiedIssue>), MapError> {
        let coordinate = &package.package;
        let canonical = package_path(&coordinate.ecosystem, &coordinate.name);
        let entity = UnifiedEntity::build(
            EntityKind::Package,
            &coordinate.name,
            &canonical,
            &format!(
                "{}:{}@{}",
                coordinate.ecosystem,
                coordinate.name,
                coordinate.version.as_deref().unwrap_or("*")
            ),
            self.name(),
            1.0,
        )
        .map_err(|e| MapError::parse(self.name(), e.to_string()))?;

        let mut issues = Vec::new();
        for (ordinal, vuln) in package.vulnerabilities.iter().enumerate() {
            let token = vuln
                .database_specific
                .as_ref()
                .and_then(|d| d.get("severity"))
                .and_then(|s| s.as_str());
            let severity = SeverityMapper::resolve(token, numeric_cvss(vuln), &vuln.aliases);

            let title = vuln
                .summary
                .clone()
                .unwrap_or_else(|| format!("{} in {}", vuln.id, coordinate.name));

            let mut metadata = BTreeMap::new();
            metadata.insert(
                "package_name".to_string(),
                Value::from(coordinate.name.clone()),
            );
            metadata.insert(
                "ecosystem".to_string(),
                Value::from(coordinate.ecosystem.clone()),
            );
            if let Some(version) = &coordinate.version {
                metadata.insert("package_version".to_string(), Value::from(version.clone()));
            }
            if !vuln.aliases.is_empty() {
                metadata.insert("aliases".to_string(), Value::from(vuln.aliases.clone()));
            }
            if let Some(score) = numeric_cvss(vuln) {
                metadata.insert("cvss_score".to_string(), Value::from(score));
            }
            if let Some(token) = token {
                metadata.insert("native_severity".to_string(), Value::from(token));
            }

            let issue = IssueBuilder::new(&entity, self.category(), self.name())
                .severity(severity)
                .title(&title)
                .description(vuln.details.as_deref().unwrap_or(&title))
                .rule_id(&vuln.id)
                .metadata(metadata)
                .hints(CorrelationHints::with_patterns(&["security_vulnerability"]))
                .ordinal(ordinal as u32)
                .build()
                .map_err(|e| MapError::parse(self.name(), e.to_string()))?;
            issues.push(issue);
        }

        Ok((entity, issues))
    }
}

/// Extract a numeric CVSS base score when the feed carries one.
/// OSV severity scores are usually vector strings; plain numbers appear in
/// some databases and are accepted as-is.
fn numeric_cvss(vuln: &OsvVulnerability) -> Option<f64> {
    for sev in &vuln.severity {
        if !matches!(sev.kind.as_deref(), None | Some("CVSS_V2") | Some("CVSS_V3") | Some("CVSS_V4"))
        {
            continue;
        }
        match &sev.score {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) => {
                if let Ok(score) = s.parse::<f64>() {
                    return Some(score);
                }
            }
            _ => {}
        }
    }
    None
}
