//! Unified entities — the things issues attach to.

use serde::{Deserialize, Serialize};

use crate::canonical;
use crate::errors::SchemaError;

/// What kind of project artifact an entity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    File,
    Manifest,
    Lockfile,
    Package,
    Application,
    District,
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Manifest => "manifest",
            Self::Lockfile => "lockfile",
            Self::Package => "package",
            Self::Application => "application",
            Self::District => "district",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A project artifact an issue can attach to.
///
/// The id is deterministic from `(kind, canonical_path)`, so two entities
/// with the same canonical coordinates always share an id no matter
/// which mapper produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedEntity {
    pub id: String,
    pub kind: EntityKind,
    pub name: String,
    pub canonical_path: String,
    /// The tool-native identifier, retained for audit.
    pub original_id: String,
    pub tool: String,
    pub confidence: f64,
}

impl UnifiedEntity {
    /// Construct an entity, enforcing the schema invariants.
    ///
    /// The canonical path must already be canonical (produced by
    /// `PathCanonicalizer::normalize` or `package_path`); a `..` segment
    /// means a mapper leaked a raw path and is rejected.
    pub fn build(
        kind: EntityKind,
        name: &str,
        canonical_path: &str,
        original_id: &str,
        tool: &str,
        confidence: f64,
    ) -> Result<Self, SchemaError> {
        if canonical_path.is_empty() {
            return Err(SchemaError::EmptyField {
                field: "canonical_path",
            });
        }
        if canonical_path.split('/').any(|s| s == "..") {
            return Err(SchemaError::PathEscapesRoot {
                path: canonical_path.to_string(),
            });
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(SchemaError::InvalidConfidence { value: confidence });
        }

        Ok(Self {
            id: canonical::entity_id(kind, canonical_path),
            kind,
            name: name.to_string(),
            canonical_path: canonical_path.to_string(),
            original_id: original_id.to_string(),
            tool: tool.to_string(),
            confidence,
        })
    }
}
