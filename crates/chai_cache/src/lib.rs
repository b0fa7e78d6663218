//! Incremental build cache management.
//!
//! This crate persists a fingerprint of every successfully compiled source so
//! that later builds only recompile sources whose macro-expanded content has
//! changed, or whose object artifact has gone missing.

#![warn(missing_docs)]

pub mod error;
pub mod hashstamp;

pub use error::CacheError;
pub use hashstamp::BuildCache;
