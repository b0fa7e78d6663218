//! Shared foundational types used across the chai build tool.
//!
//! This crate provides content fingerprints for staleness detection and the
//! workspace resolver that locates the `.chai` build root on disk.

#![warn(missing_docs)]

pub mod hash;
pub mod workspace;

pub use hash::{Fingerprint, ParseFingerprintError};
pub use workspace::{find_build_root, Workspace, WorkspaceError, MARKER_DIR};
