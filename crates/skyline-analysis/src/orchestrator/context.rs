//! Shared analyzer state, passed explicitly instead of living in globals.

use std::path::{Path, PathBuf};

use skyline_core::canonical::{PathCanonicalizer, DEFAULT_TEMP_PATTERNS};
use skyline_core::config::AnalyzerConfig;
use skyline_core::errors::OrchestratorError;

use crate::driver::DriverKernel;

/// Everything an analysis run needs: the validated project root, the path
/// canonicalizer keyed to it, the configuration, and the driver kernel.
#[derive(Debug, Clone)]
pub struct AnalyzerContext {
    project_root: PathBuf,
    /// Normalized absolute form of the root, used as `project_path` on every
    /// result.
    project_path: String,
    canon: PathCanonicalizer,
    config: AnalyzerConfig,
    kernel: DriverKernel,
}

impl AnalyzerContext {
    /// Validate the project root and build the run context. Config-supplied
    /// temp patterns extend the built-in defaults.
    pub fn new(project_root: &Path, config: AnalyzerConfig) -> Result<Self, OrchestratorError> {
        if !project_root.is_dir() {
            return Err(OrchestratorError::ProjectRootInvalid {
                path: project_root.display().to_string(),
            });
        }
        if !project_root.is_absolute() {
            return Err(OrchestratorError::ProjectRootInvalid {
                path: project_root.display().to_string(),
            });
        }

        let mut temp_patterns: Vec<String> = DEFAULT_TEMP_PATTERNS
            .iter()
            .map(|s| s.to_string())
            .collect();
        temp_patterns.extend(config.temp_patterns.iter().cloned());

        let canon = PathCanonicalizer::with_temp_patterns(project_root, temp_patterns);
        let project_path = canon.root().to_string();

        Ok(Self {
            project_root: project_root.to_path_buf(),
            project_path,
            canon,
            config,
            kernel: DriverKernel::new(),
        })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn project_path(&self) -> &str {
        &self.project_path
    }

    pub fn canon(&self) -> &PathCanonicalizer {
        &self.canon
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn kernel(&self) -> &DriverKernel {
        &self.kernel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_root() {
        let err = AnalyzerContext::new(
            Path::new("/definitely/not/a/real/dir"),
            AnalyzerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, OrchestratorError::ProjectRootInvalid { .. }));
    }

    #[test]
    fn rejects_relative_root() {
        let err =
            AnalyzerContext::new(Path::new("relative/dir"), AnalyzerConfig::default()).unwrap_err();
        assert!(matches!(err, OrchestratorError::ProjectRootInvalid { .. }));
    }

    #[test]
    fn config_patterns_extend_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalyzerConfig {
            temp_patterns: vec!["/scratch/".to_string()],
            ..Default::default()
        };
        let ctx = AnalyzerContext::new(dir.path(), config).unwrap();
        assert_eq!(
            ctx.canon().normalize("/scratch/run-1/package.json"),
            "run-1/package.json"
        );
        assert_eq!(
            ctx.canon().normalize("/tmp/run-2/package.json"),
            "run-2/package.json"
        );
    }
}
