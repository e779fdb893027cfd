//! Universal severity levels and the native-to-universal resolution ladder.

use serde::{Deserialize, Serialize};

/// The five universal severity levels.
///
/// `Ord` ranks `Info` lowest and `Critical` highest so consumers can sort
/// findings without a lookup table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All five levels, lowest first.
    pub fn all() -> &'static [Severity] {
        &[
            Self::Info,
            Self::Low,
            Self::Medium,
            Self::High,
            Self::Critical,
        ]
    }

    /// Severity name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Info => "info",
        }
    }

    /// Map a tool's native severity token. Unknown tokens map to nothing;
    /// the resolution ladder in [`SeverityMapper`] supplies the floor.
    pub fn parse_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "critical" | "very_high" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" | "moderate" => Some(Self::Medium),
            "low" => Some(Self::Low),
            "info" | "informational" | "note" => Some(Self::Info),
            _ => None,
        }
    }

    /// Map a CVSS base score.
    pub fn from_cvss(score: f64) -> Self {
        if score >= 9.0 {
            Self::Critical
        } else if score >= 7.0 {
            Self::High
        } else if score >= 4.0 {
            Self::Medium
        } else if score >= 0.1 {
            Self::Low
        } else {
            Self::Info
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The contractual resolution ladder shared by every adapter.
///
/// Precedence: explicit token, then CVSS score, then a CVE-alias floor of
/// `Medium`, then `Info`. An unknown token never produces "no severity".
pub struct SeverityMapper;

impl SeverityMapper {
    pub fn resolve(token: Option<&str>, cvss: Option<f64>, aliases: &[String]) -> Severity {
        if let Some(sev) = token.and_then(Severity::parse_token) {
            return sev;
        }
        if let Some(score) = cvss {
            return Severity::from_cvss(score);
        }
        if aliases.iter().any(|a| a.starts_with("CVE-")) {
            // Deliberate floor: a known CVE without any score is not "info".
            return Severity::Medium;
        }
        Severity::Info
    }
}
