//! Hash collections used across the kernel.
//!
//! Re-exports of AHash-backed maps and sets; instance registries, handler
//! tables and data maps all use these aliases.

// Re-export optimized hash collections
pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};
