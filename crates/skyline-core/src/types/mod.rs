//! Shared primitive types and collections.

pub mod collections;
