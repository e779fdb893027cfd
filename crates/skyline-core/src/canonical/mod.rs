//! Canonical path and identifier machinery.
//!
//! This is the contract that lets every mapper produce the same key for
//! "the same file" regardless of how the producing tool was invoked.

pub mod identity;
pub mod paths;

pub use identity::{correlation_key, entity_id};
pub use paths::{package_path, PathCanonicalizer, DEFAULT_TEMP_PATTERNS};
