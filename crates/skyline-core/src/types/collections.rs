//! FxHash-backed collections used throughout the workspace.
//!
//! Iteration order of these maps is arbitrary; anything that leaves the
//! core (results, groups, metadata) must be sorted or stored in a BTreeMap
//! so downstream consumers see deterministic output.

pub use rustc_hash::{FxHashMap, FxHashSet};
