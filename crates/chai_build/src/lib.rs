//! The incremental parallel build engine.
//!
//! Given a project layout, this crate discovers the project's C/C++ sources,
//! fingerprints each one's macro-expanded text, recompiles only the stale ones
//! on a fixed-size worker pool, and links every object into the executable.
//!
//! Toolchain invocations are built from [`CommandTemplate`]s and run through
//! the [`Toolchain`] trait, so the engine can be driven by the real compiler
//! ([`ShellToolchain`]) or by a recording fake in tests.

#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod link;
pub mod pipeline;
pub mod scheduler;
pub mod sources;
pub mod toolchain;

#[cfg(test)]
mod testing;

pub use command::{format, CommandTemplate, TemplateError, PLACEHOLDER};
pub use error::BuildError;
pub use link::{collect_objects, link};
pub use pipeline::{build, build_with, BuildReport};
pub use scheduler::{FailedSource, ScheduleReport, Scheduler, WorkQueue};
pub use sources::{check_duplicates, discover_sources, object_path, SOURCE_EXTENSIONS};
pub use toolchain::{ShellToolchain, Toolchain, ToolchainError};
