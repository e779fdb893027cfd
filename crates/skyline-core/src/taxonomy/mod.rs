//! The fixed severity and category taxonomy every adapter maps into.

pub mod category;
pub mod severity;

pub use category::AnalysisCategory;
pub use severity::{Severity, SeverityMapper};
