//! Error types for the build engine.

use std::path::{Path, PathBuf};

use chai_cache::CacheError;
use chai_common::WorkspaceError;
use chai_config::ConfigError;

use crate::toolchain::ToolchainError;

/// Errors that abort a build.
///
/// Per-source toolchain failures do not appear here: they are recorded in the
/// build report and the build carries on with the remaining sources.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The workspace could not be resolved.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// The project layout is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The build cache could not be read or written.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A filesystem operation on the build tree failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Two sources would compile to the same object artifact.
    #[error(
        "duplicate source name: {} and {} both compile to {object}; rename one before rebuilding",
        first.display(),
        second.display()
    )]
    DuplicateSource {
        /// The shared object file name.
        object: String,
        /// The source seen first.
        first: PathBuf,
        /// The conflicting source.
        second: PathBuf,
    },

    /// The scheduler was asked to run with zero workers.
    #[error("worker count must be at least 1")]
    NoWorkers,

    /// The worker thread pool could not be created.
    #[error("failed to start compile workers: {0}")]
    ThreadPool(String),

    /// There are no objects to link.
    #[error("nothing to link: no objects for {}", output.display())]
    NothingToLink {
        /// The executable that would have been written.
        output: PathBuf,
    },

    /// The link step failed.
    #[error("link failed: {0}")]
    Link(#[source] ToolchainError),
}

impl BuildError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
