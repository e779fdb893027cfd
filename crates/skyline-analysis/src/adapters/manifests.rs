//! Synthetic single-dependency manifests.
//!
//! Ecosystem scanners take a project tree as input, so probing a single
//! package coordinate means writing a minimal manifest into a scratch
//! directory first. These renderers produce that manifest text.

use serde_json::json;

/// A `package.json` declaring exactly one dependency. `version` falls back
/// to `*` when the caller has no constraint.
pub fn npm_manifest(name: &str, version: Option<&str>) -> String {
    let doc = json!({
        "name": "skyline-probe",
        "version": "0.0.0",
        "private": true,
        "dependencies": {
            name: version.unwrap_or("*"),
        },
    });
    // json! never produces non-serializable values.
    serde_json::to_string_pretty(&doc).unwrap_or_default()
}

/// One `requirements.txt` line. A pinned version renders as `name==version`.
pub fn pip_requirement(name: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("{name}=={v}\n"),
        None => format!("{name}\n"),
    }
}

/// A minimal `Cargo.toml` with one `[dependencies]` entry.
pub fn cargo_manifest(name: &str, version: Option<&str>) -> String {
    format!(
        "[package]\nname = \"skyline-probe\"\nversion = \"0.0.0\"\nedition = \"2021\"\n\n\
         [dependencies]\n{name} = \"{}\"\n",
        version.unwrap_or("*")
    )
}

/// Manifest file name and contents for one dependency coordinate, or `None`
/// for an ecosystem without a renderer.
pub fn render(ecosystem: &str, name: &str, version: Option<&str>) -> Option<(&'static str, String)> {
    match ecosystem.to_ascii_lowercase().as_str() {
        "npm" | "node" => Some(("package.json", npm_manifest(name, version))),
        "pypi" | "pip" | "python" => Some(("requirements.txt", pip_requirement(name, version))),
        "cargo" | "crates.io" | "rust" => Some(("Cargo.toml", cargo_manifest(name, version))),
        _ => None,
    }
}
