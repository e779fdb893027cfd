//! Path canonicalization relative to a project root.

use std::path::Path;

/// Default prefixes that identify scratch locations. A path outside the
/// project root matching one of these collapses to its last two segments,
/// so synthetic-manifest probes key the same way on every run.
pub const DEFAULT_TEMP_PATTERNS: &[&str] = &["/tmp/", "/var/folders/", "/private/var/", "/temp/"];

/// Canonicalizes file paths relative to one project root.
///
/// Canonical form: forward slashes, no leading `./`, relative to the root
/// when the path lies inside it. Purely lexical — the pipeline must key
/// files that a tool reported but that may no longer exist on disk.
#[derive(Debug, Clone)]
pub struct PathCanonicalizer {
    root: String,
    temp_patterns: Vec<String>,
}

impl PathCanonicalizer {
    /// Create a canonicalizer for the given project root with default
    /// temp-dir patterns.
    pub fn new(project_root: &Path) -> Self {
        Self::with_temp_patterns(
            project_root,
            DEFAULT_TEMP_PATTERNS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Create a canonicalizer with explicit temp-dir patterns.
    pub fn with_temp_patterns(project_root: &Path, temp_patterns: Vec<String>) -> Self {
        let root = lexical_normalize(&project_root.to_string_lossy().replace('\\', "/"));
        Self {
            root,
            temp_patterns,
        }
    }

    /// The normalized project root.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Normalize a path to canonical form.
    ///
    /// Inside the root: the relative form. Outside the root under a temp
    /// prefix: the last two segments joined. Otherwise the input is returned
    /// unchanged apart from separator normalization. Idempotent.
    pub fn normalize(&self, path: &str) -> String {
        let slashed = path.replace('\\', "/");
        let lexical = lexical_normalize(&slashed);

        if lexical.starts_with('/') {
            return self.normalize_absolute(&lexical);
        }

        if lexical.starts_with("../") || lexical == ".." {
            // Relative escape: anchor at the root and retry as absolute.
            let joined = lexical_normalize(&format!("{}/{}", self.root, lexical));
            return self.normalize_absolute(&joined);
        }

        lexical
    }

    fn normalize_absolute(&self, lexical: &str) -> String {
        if let Some(rel) = strip_root(lexical, &self.root) {
            return rel.to_string();
        }

        if self
            .temp_patterns
            .iter()
            .any(|p| lexical.to_ascii_lowercase().contains(&p.to_ascii_lowercase()))
        {
            let segments: Vec<&str> = lexical.split('/').filter(|s| !s.is_empty()).collect();
            if segments.len() >= 2 {
                return segments[segments.len() - 2..].join("/");
            }
        }

        lexical.to_string()
    }
}

/// Deterministic synthetic path for a dependency package, keyed by ecosystem.
pub fn package_path(ecosystem: &str, name: &str) -> String {
    match ecosystem.to_ascii_lowercase().as_str() {
        "npm" | "node" => format!("node_modules/{name}"),
        "pypi" | "pip" | "python" => format!("site-packages/{name}"),
        "cargo" | "crates.io" | "rust" => format!("target/package/{name}"),
        "go" | "golang" => format!("go/pkg/{name}"),
        other => format!("dependencies/{other}/{name}"),
    }
}

/// Lexically resolve `.` and `..` segments and collapse separators.
/// Leading `..` segments that escape a relative path are preserved.
fn lexical_normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut stack: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match stack.last() {
                Some(&top) if top != ".." => {
                    stack.pop();
                }
                // Absolute paths cannot climb above `/`.
                _ if absolute => {}
                _ => stack.push(".."),
            },
            s => stack.push(s),
        }
    }

    let joined = stack.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// If `path` lies inside `root`, return its relative form.
fn strip_root<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    if root == "/" {
        return path.strip_prefix('/');
    }
    if path == root {
        return Some(".");
    }
    path.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
}
