//! Unified issues — single diagnostics attached to one entity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use smallvec::SmallVec;

use crate::canonical;
use crate::errors::SchemaError;
use crate::taxonomy::{AnalysisCategory, Severity};

use super::entity::UnifiedEntity;

/// A full source location. 1-based; all four coordinates always present.
/// Tools that report only a start position get `end = start`, set
/// explicitly by their mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

/// Search radius for cross-tool grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRadius {
    pub lines: u32,
    pub columns: u32,
}

impl Default for SearchRadius {
    fn default() -> Self {
        Self {
            lines: 5,
            columns: 10,
        }
    }
}

/// Per-issue correlation hints declared by the producing mapper.
///
/// Adding a new cross-tool pattern tag requires no engine change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CorrelationHints {
    /// Which fields the engine should compare when grouping.
    pub similarity_factors: SmallVec<[String; 4]>,
    pub search_radius: SearchRadius,
    /// Free-form tag set, e.g. `security_vulnerability`, `dead_code`.
    pub cross_tool_patterns: SmallVec<[String; 4]>,
}

impl CorrelationHints {
    /// Hints with default radius and the given pattern tags.
    pub fn with_patterns(patterns: &[&str]) -> Self {
        Self {
            similarity_factors: SmallVec::from_vec(vec![
                "canonical_path".to_string(),
                "line".to_string(),
            ]),
            search_radius: SearchRadius::default(),
            cross_tool_patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// A single diagnostic produced by one tool for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedIssue {
    pub id: String,
    pub entity_id: String,
    pub severity: Severity,
    pub category: AnalysisCategory,
    pub title: String,
    pub description: String,
    pub rule_id: String,
    /// None for non-source artifacts such as packages.
    pub location: Option<SourceLocation>,
    pub tool: String,
    /// Tool-specific fields preserved verbatim. Immutable after validation;
    /// the correlation engine reads only declared fields.
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub correlation_key: String,
    pub hints: CorrelationHints,
}

/// Builder enforcing the issue invariants at the trust boundary.
pub struct IssueBuilder<'a> {
    entity: &'a UnifiedEntity,
    severity: Severity,
    category: AnalysisCategory,
    tool: String,
    title: String,
    description: String,
    rule_id: String,
    line: Option<u32>,
    column: Option<u32>,
    end_line: Option<u32>,
    end_column: Option<u32>,
    metadata: BTreeMap<String, serde_json::Value>,
    hints: CorrelationHints,
    ordinal: u32,
}

impl<'a> IssueBuilder<'a> {
    pub fn new(entity: &'a UnifiedEntity, category: AnalysisCategory, tool: &str) -> Self {
        Self {
            entity,
            severity: Severity::Info,
            category,
            tool: tool.to_string(),
            title: String::new(),
            description: String::new(),
            rule_id: String::new(),
            line: None,
            column: None,
            end_line: None,
            end_column: None,
            metadata: BTreeMap::new(),
            hints: CorrelationHints::default(),
            ordinal: 0,
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn rule_id(mut self, rule_id: &str) -> Self {
        self.rule_id = rule_id.to_string();
        self
    }

    /// Raw location coordinates as the tool reported them.
    /// Partial combinations are rejected at `build`.
    pub fn location_parts(
        mut self,
        line: Option<u32>,
        column: Option<u32>,
        end_line: Option<u32>,
        end_column: Option<u32>,
    ) -> Self {
        self.line = line;
        self.column = column;
        self.end_line = end_line;
        self.end_column = end_column;
        self
    }

    pub fn metadata_value(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn metadata(mut self, metadata: BTreeMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn hints(mut self, hints: CorrelationHints) -> Self {
        self.hints = hints;
        self
    }

    /// Disambiguates otherwise-identical issues (same rule, same line)
    /// within one run so ids stay unique and stable.
    pub fn ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = ordinal;
        self
    }

    pub fn build(self) -> Result<UnifiedIssue, SchemaError> {
        if self.title.is_empty() {
            return Err(SchemaError::EmptyField { field: "title" });
        }

        let location = resolve_location(self.line, self.column, self.end_line, self.end_column)?;

        let correlation_key = canonical::correlation_key(
            &self.entity.canonical_path,
            location.map(|l| l.line),
            self.category,
            &self.tool,
        );

        let digest = Sha256::digest(
            format!(
                "{}|{}|{}|{}|{}",
                self.tool,
                self.entity.id,
                self.rule_id,
                location.map(|l| l.line).unwrap_or(0),
                self.ordinal
            )
            .as_bytes(),
        );
        let mut id = String::with_capacity(16);
        for byte in digest.iter().take(8) {
            id.push_str(&format!("{byte:02x}"));
        }

        Ok(UnifiedIssue {
            id,
            entity_id: self.entity.id.clone(),
            severity: self.severity,
            category: self.category,
            title: self.title,
            description: self.description,
            rule_id: self.rule_id,
            location,
            tool: self.tool,
            metadata: self.metadata,
            correlation_key,
            hints: self.hints,
        })
    }
}

/// Either all four coordinates or none, 1-based.
fn resolve_location(
    line: Option<u32>,
    column: Option<u32>,
    end_line: Option<u32>,
    end_column: Option<u32>,
) -> Result<Option<SourceLocation>, SchemaError> {
    let parts = [line, column, end_line, end_column];
    let present = parts.iter().filter(|p| p.is_some()).count();

    match present {
        0 => Ok(None),
        4 => {
            let (line, column) = (line.unwrap_or(0), column.unwrap_or(0));
            let (end_line, end_column) = (end_line.unwrap_or(0), end_column.unwrap_or(0));
            if line == 0 || column == 0 || end_line < line {
                return Err(SchemaError::InvalidLocation { line, column });
            }
            Ok(Some(SourceLocation {
                line,
                column,
                end_line,
                end_column,
            }))
        }
        n => Err(SchemaError::PartialLocation { present: n }),
    }
}
