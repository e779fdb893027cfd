//! The tool driver kernel — the single subprocess-execution primitive every
//! adapter uses. Enforces the argument, env, timeout, buffer, and temp-state
//! policies; never interprets exit codes.

pub mod args;
pub mod cancellation;
pub mod env;
pub mod kernel;
pub mod scratch;

pub use cancellation::CancellationToken;
pub use kernel::{CommandSpec, DriverKernel, RunOptions, RunOutcome};
pub use scratch::ScratchDir;
