//! Analysis orchestration: project detection, adapter selection, and the
//! bounded parallel fan-out with partial-failure semantics.

pub mod context;
pub mod detect;
#[allow(clippy::module_inception)]
pub mod orchestrator;

pub use context::AnalyzerContext;
pub use detect::{detect_indicators, ProjectIndicators};
pub use orchestrator::{analyze, Analyzer};
