//! # skyline-analysis
//!
//! Analysis pipeline for the Skyline engine: the sandboxed tool driver
//! kernel, per-tool adapters and mappers, the analyzer orchestrator, the
//! correlation engine, and the validator.

pub mod adapters;
pub mod correlation;
pub mod driver;
pub mod orchestrator;
pub mod validator;

pub use correlation::CorrelationEngine;
pub use driver::{CancellationToken, CommandSpec, DriverKernel, RunOptions, RunOutcome};
pub use orchestrator::{analyze, Analyzer, AnalyzerContext};
pub use validator::{ValidationSummary, Validator, Violation};
