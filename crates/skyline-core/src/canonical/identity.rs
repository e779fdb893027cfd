//! Stable identifier derivation.

use sha2::{Digest, Sha256};
use xxhash_rust::xxh3::xxh3_64;

use crate::model::EntityKind;
use crate::taxonomy::AnalysisCategory;

/// Stable entity id: first 16 hex chars of SHA-256 over `<kind>|<path>`.
///
/// Collisions at this length are tolerated for visualization, but the
/// correlation engine never merges on id alone — it compares the full
/// `(path, line, category, tool)` tuple before grouping.
pub fn entity_id(kind: EntityKind, canonical_path: &str) -> String {
    let digest = Sha256::digest(format!("{}|{}", kind.name(), canonical_path).as_bytes());
    let mut id = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        id.push_str(&format!("{byte:02x}"));
    }
    id
}

/// Correlation key for an issue: xxh3 over `path|line|category|tool`.
///
/// The tool is included so per-tool identity survives into grouping; the
/// engine groups across tools in a later pass using the hints radius.
pub fn correlation_key(
    canonical_path: &str,
    line: Option<u32>,
    category: AnalysisCategory,
    tool: &str,
) -> String {
    let line = line.unwrap_or(0);
    let input = format!("{canonical_path}|{line}|{}|{tool}", category.name());
    format!("{:016x}", xxh3_64(input.as_bytes()))
}
