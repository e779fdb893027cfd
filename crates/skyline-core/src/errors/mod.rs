//! Error types for every subsystem, each with a stable machine code.

pub mod driver_error;
pub mod error_code;
pub mod map_error;
pub mod orchestrator_error;
pub mod schema_error;

pub use driver_error::DriverError;
pub use error_code::SkylineErrorCode;
pub use map_error::MapError;
pub use orchestrator_error::OrchestratorError;
pub use schema_error::SchemaError;
