//! Language and manifest auto-detection.
//!
//! Decides the default adapter set by checking for ecosystem marker files
//! and sampling source-file extensions.

use std::collections::BTreeSet;
use std::path::Path;

use skyline_core::canonical::PathCanonicalizer;

/// How many directory entries the extension walk inspects at most.
const WALK_BUDGET: usize = 10_000;
/// Cap on collected C/C++ sources handed to verification tools.
const MAX_C_SOURCES: usize = 32;

/// Observed project indicators.
#[derive(Debug, Clone, Default)]
pub struct ProjectIndicators {
    pub has_package_json: bool,
    pub has_package_lock: bool,
    pub has_cargo_toml: bool,
    pub has_go_mod: bool,
    pub has_requirements_txt: bool,
    pub has_pipfile_lock: bool,
    /// Languages seen by extension: "python", "go", "rust", "c", "cpp",
    /// "typescript".
    pub languages: BTreeSet<String>,
    /// Canonical paths of C/C++ sources, sorted, capped.
    pub c_sources: Vec<String>,
}

impl ProjectIndicators {
    pub fn has_language(&self, lang: &str) -> bool {
        self.languages.contains(lang)
    }

    /// A project with no manifests and no recognized sources.
    pub fn is_empty(&self) -> bool {
        !self.has_package_json
            && !self.has_package_lock
            && !self.has_cargo_toml
            && !self.has_go_mod
            && !self.has_requirements_txt
            && !self.has_pipfile_lock
            && self.languages.is_empty()
    }
}

/// Detect manifests and languages present in the project.
pub fn detect_indicators(root: &Path, canon: &PathCanonicalizer) -> ProjectIndicators {
    let mut ind = ProjectIndicators {
        has_package_json: root.join("package.json").exists(),
        has_package_lock: root.join("package-lock.json").exists(),
        has_cargo_toml: root.join("Cargo.toml").exists(),
        has_go_mod: root.join("go.mod").exists(),
        has_requirements_txt: root.join("requirements.txt").exists(),
        has_pipfile_lock: root.join("Pipfile.lock").exists(),
        ..Default::default()
    };

    // Top-level quick check catches flat projects without paying for a walk.
    for (pattern, lang) in [
        ("*.py", "python"),
        ("*.go", "go"),
        ("*.rs", "rust"),
        ("*.c", "c"),
        ("*.cpp", "cpp"),
        ("*.ts", "typescript"),
    ] {
        if glob_exists(root, pattern) {
            ind.languages.insert(lang.to_string());
        }
    }

    // Deeper walk honoring .gitignore, bounded by WALK_BUDGET.
    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .follow_links(false)
        .build();

    let mut seen = 0usize;
    for entry in walker {
        if seen >= WALK_BUDGET {
            break;
        }
        seen += 1;

        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "walk error during detection");
                continue;
            }
        };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if let Some(lang) = extension_language(ext) {
            ind.languages.insert(lang.to_string());
        }

        if matches!(ext, "c" | "cpp" | "cc") && ind.c_sources.len() < MAX_C_SOURCES {
            ind.c_sources
                .push(canon.normalize(&path.to_string_lossy()));
        }
    }

    ind.c_sources.sort();
    ind.c_sources.dedup();
    ind
}

fn extension_language(ext: &str) -> Option<&'static str> {
    match ext {
        "py" => Some("python"),
        "go" => Some("go"),
        "rs" => Some("rust"),
        "c" => Some("c"),
        "cpp" | "cc" => Some("cpp"),
        "ts" | "tsx" => Some("typescript"),
        _ => None,
    }
}

/// Check if any file matching a glob pattern exists in a directory.
fn glob_exists(root: &Path, pattern: &str) -> bool {
    let full_pattern = root.join(pattern).display().to_string();
    glob::glob(&full_pattern)
        .map(|mut paths| paths.next().is_some())
        .unwrap_or(false)
}
