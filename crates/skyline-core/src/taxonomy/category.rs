//! Analysis categories. Declared per adapter at construction time — one
//! adapter emits exactly one category, never derived per issue.

use serde::{Deserialize, Serialize};

/// The six analysis categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisCategory {
    DependencySecurity,
    #[default]
    StaticQuality,
    TypeChecking,
    FormalVerification,
    ApplicationSecurity,
    Architecture,
}

impl AnalysisCategory {
    /// All six categories.
    pub fn all() -> &'static [AnalysisCategory] {
        &[
            Self::DependencySecurity,
            Self::StaticQuality,
            Self::TypeChecking,
            Self::FormalVerification,
            Self::ApplicationSecurity,
            Self::Architecture,
        ]
    }

    /// Category name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DependencySecurity => "dependency_security",
            Self::StaticQuality => "static_quality",
            Self::TypeChecking => "type_checking",
            Self::FormalVerification => "formal_verification",
            Self::ApplicationSecurity => "application_security",
            Self::Architecture => "architecture",
        }
    }

    /// Parse from string.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "dependency_security" => Some(Self::DependencySecurity),
            "static_quality" => Some(Self::StaticQuality),
            "type_checking" => Some(Self::TypeChecking),
            "formal_verification" => Some(Self::FormalVerification),
            "application_security" => Some(Self::ApplicationSecurity),
            "architecture" => Some(Self::Architecture),
            _ => None,
        }
    }

    /// Whether findings in this category describe security exposure.
    pub fn is_security(&self) -> bool {
        matches!(self, Self::DependencySecurity | Self::ApplicationSecurity)
    }
}

impl std::fmt::Display for AnalysisCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
