//! Analyzer configuration.

use serde::{Deserialize, Serialize};

/// Resource limits for external tool runs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DriverLimits {
    /// Hard deadline per run in milliseconds. Default: 120_000 (2 min);
    /// adapters may declare a larger class default up to 10 min.
    pub timeout_ms: Option<u64>,
    /// Availability-probe deadline in milliseconds. Default: 5_000.
    pub probe_timeout_ms: Option<u64>,
    /// Combined stdout/stderr byte budget per stream. Default: 10 MB.
    pub max_output_bytes: Option<usize>,
}

impl DriverLimits {
    pub fn effective_timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(120_000)
    }

    pub fn effective_probe_timeout_ms(&self) -> u64 {
        self.probe_timeout_ms.unwrap_or(5_000)
    }

    pub fn effective_max_output_bytes(&self) -> usize {
        self.max_output_bytes.unwrap_or(10 * 1024 * 1024)
    }
}

/// Configuration for the analyzer orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Maximum adapters running concurrently. 0 = auto (CPU count).
    pub concurrency: Option<usize>,
    /// Tools to skip even when applicable.
    #[serde(default)]
    pub disabled_tools: Vec<String>,
    /// Extra temp-dir prefixes for path canonicalization, beyond the
    /// built-in defaults.
    #[serde(default)]
    pub temp_patterns: Vec<String>,
    pub limits: DriverLimits,
}

impl AnalyzerConfig {
    /// Returns the effective concurrency limit, defaulting to the CPU count.
    pub fn effective_concurrency(&self) -> usize {
        match self.concurrency {
            Some(0) | None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            Some(n) => n,
        }
    }

    /// Parse from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let cfg = AnalyzerConfig::default();
        assert!(cfg.effective_concurrency() >= 1);
        assert_eq!(cfg.limits.effective_timeout_ms(), 120_000);
        assert_eq!(cfg.limits.effective_max_output_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn toml_round_trip() {
        let cfg = AnalyzerConfig::from_toml_str(
            r#"
concurrency = 2
disabled_tools = ["cbmc"]

[limits]
timeout_ms = 600000
"#,
        )
        .unwrap();
        assert_eq!(cfg.effective_concurrency(), 2);
        assert_eq!(cfg.disabled_tools, vec!["cbmc".to_string()]);
        assert_eq!(cfg.limits.effective_timeout_ms(), 600_000);
        assert_eq!(cfg.limits.effective_probe_timeout_ms(), 5_000);
    }
}
