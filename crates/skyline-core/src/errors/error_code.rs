//! Stable machine-readable error codes.
//!
//! Human text lives in the `thiserror` display strings; downstream consumers
//! (reporting, visualization) branch on these codes instead.

/// Trait implemented by every Skyline error enum.
pub trait SkylineErrorCode {
    /// A stable, SCREAMING_SNAKE string identifying the error class.
    fn error_code(&self) -> &'static str;
}

pub const UNSAFE_ARGUMENT: &str = "DRIVER_UNSAFE_ARGUMENT";
pub const TIMEOUT: &str = "DRIVER_TIMEOUT";
pub const OUTPUT_EXCEEDED: &str = "DRIVER_OUTPUT_EXCEEDED";
pub const TOOL_UNAVAILABLE: &str = "DRIVER_TOOL_UNAVAILABLE";
pub const INVALID_WORKING_DIR: &str = "DRIVER_INVALID_WORKING_DIR";
pub const DRIVER_IO: &str = "DRIVER_IO";
pub const CANCELLED: &str = "DRIVER_CANCELLED";

pub const SCHEMA_ERROR: &str = "SCHEMA_ERROR";
pub const SCHEMA_PARTIAL_LOCATION: &str = "SCHEMA_PARTIAL_LOCATION";
pub const SCHEMA_PATH_ESCAPES_ROOT: &str = "SCHEMA_PATH_ESCAPES_ROOT";
pub const SCHEMA_UNKNOWN_ENTITY: &str = "SCHEMA_UNKNOWN_ENTITY";
pub const SCHEMA_INVALID_CONFIDENCE: &str = "SCHEMA_INVALID_CONFIDENCE";
pub const SCHEMA_INVALID_LOCATION: &str = "SCHEMA_INVALID_LOCATION";

pub const PARSE_ERROR: &str = "MAP_PARSE_ERROR";

pub const ORCHESTRATOR_ERROR: &str = "ORCHESTRATOR_ERROR";
pub const PROJECT_ROOT_INVALID: &str = "ORCHESTRATOR_PROJECT_ROOT_INVALID";
