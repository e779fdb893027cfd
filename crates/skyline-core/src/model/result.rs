//! Unified analysis results — the outcome of one tool run for one project.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::errors::SchemaError;
use crate::taxonomy::AnalysisCategory;

use super::entity::UnifiedEntity;
use super::issue::UnifiedIssue;

/// Run metadata attached to every result.
///
/// `timestamp_ms` is excluded from determinism comparisons; everything else
/// must be byte-identical across repeated runs on the same input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunMetadata {
    pub timestamp_ms: u64,
    pub tool_version: Option<String>,
    /// Set when the run failed; the result is then empty.
    pub error: Option<String>,
    pub cancelled: bool,
    /// Set when the tool was unavailable and the adapter was skipped.
    pub skipped: bool,
    /// Free-form extras: validation records, pylint rating, exit code.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RunMetadata {
    pub fn now() -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            timestamp_ms,
            ..Default::default()
        }
    }

    pub fn with_tool_version(mut self, version: Option<String>) -> Self {
        self.tool_version = version;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// The output of one tool run for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedResult {
    pub tool: String,
    pub category: AnalysisCategory,
    /// Absolute, normalized project path.
    pub project_path: String,
    pub entities: Vec<UnifiedEntity>,
    pub issues: Vec<UnifiedIssue>,
    pub run: RunMetadata,
    pub duration_ms: u64,
}

impl UnifiedResult {
    /// Construct a result: every issue's entity id must be
    /// present in the entity set. Entities are de-duplicated by id, keeping
    /// the first occurrence.
    pub fn build(
        tool: &str,
        category: AnalysisCategory,
        project_path: &str,
        entities: Vec<UnifiedEntity>,
        issues: Vec<UnifiedIssue>,
        run: RunMetadata,
        duration_ms: u64,
    ) -> Result<Self, SchemaError> {
        let mut seen = std::collections::HashSet::new();
        let entities: Vec<UnifiedEntity> = entities
            .into_iter()
            .filter(|e| seen.insert(e.id.clone()))
            .collect();

        for issue in &issues {
            if !seen.contains(&issue.entity_id) {
                return Err(SchemaError::UnknownEntity {
                    issue_id: issue.id.clone(),
                    entity_id: issue.entity_id.clone(),
                });
            }
        }

        Ok(Self {
            tool: tool.to_string(),
            category,
            project_path: project_path.to_string(),
            entities,
            issues,
            run,
            duration_ms,
        })
    }

    /// An empty result carrying an error string — the shape every adapter
    /// failure collapses into. Never aborts sibling adapters.
    pub fn empty_with_error(
        tool: &str,
        category: AnalysisCategory,
        project_path: &str,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            tool: tool.to_string(),
            category,
            project_path: project_path.to_string(),
            entities: Vec::new(),
            issues: Vec::new(),
            run: RunMetadata::now().with_error(error),
            duration_ms,
        }
    }

    /// An empty result marking an unavailable tool as skipped.
    pub fn skipped(tool: &str, category: AnalysisCategory, project_path: &str, reason: &str) -> Self {
        let mut run = RunMetadata::now();
        run.skipped = true;
        run.error = Some(reason.to_string());
        Self {
            tool: tool.to_string(),
            category,
            project_path: project_path.to_string(),
            entities: Vec::new(),
            issues: Vec::new(),
            run,
            duration_ms: 0,
        }
    }

    /// Whether the run finished cleanly (possibly with findings).
    pub fn success(&self) -> bool {
        self.run.error.is_none() && !self.run.cancelled
    }

    /// The id of the first issue, used for deterministic cross-adapter
    /// ordering.
    pub fn first_issue_id(&self) -> &str {
        self.issues.first().map(|i| i.id.as_str()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::EntityKind;
    use crate::model::issue::IssueBuilder;

    #[test]
    fn issue_with_unknown_entity_rejected() {
        let known =
            UnifiedEntity::build(EntityKind::File, "a", "src/a.py", "a", "pylint", 1.0).unwrap();
        let stranger =
            UnifiedEntity::build(EntityKind::File, "b", "src/b.py", "b", "pylint", 1.0).unwrap();
        let issue = IssueBuilder::new(&stranger, AnalysisCategory::StaticQuality, "pylint")
            .title("x")
            .build()
            .unwrap();

        let err = UnifiedResult::build(
            "pylint",
            AnalysisCategory::StaticQuality,
            "/p",
            vec![known],
            vec![issue],
            RunMetadata::now(),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownEntity { .. }));
    }

    #[test]
    fn entities_deduplicated_by_id() {
        let a = UnifiedEntity::build(EntityKind::File, "a", "src/a.py", "a", "pylint", 1.0).unwrap();
        let a2 = a.clone();
        let result = UnifiedResult::build(
            "pylint",
            AnalysisCategory::StaticQuality,
            "/p",
            vec![a, a2],
            Vec::new(),
            RunMetadata::now(),
            1,
        )
        .unwrap();
        assert_eq!(result.entities.len(), 1);
    }
}
