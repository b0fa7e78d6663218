//! Workspace resolution and the on-disk layout under the `.chai` build root.
//!
//! A workspace is anchored by a `.chai` marker directory. Every project and the
//! shared build cache live beneath it:
//!
//! ```text
//! .chai/
//!   cache/hashstamps
//!   projects/<name>/project_layout
//!   projects/<name>/build/objects/        (temp/ is transient)
//!   projects/<name>/build/executable/<name>
//! ```

use std::path::{Path, PathBuf};

/// Name of the marker directory that anchors a workspace.
pub const MARKER_DIR: &str = ".chai";

const CACHE_DIR: &str = "cache";
const CACHE_FILE: &str = "hashstamps";
const PROJECTS_DIR: &str = "projects";
const LAYOUT_FILE: &str = "project_layout";
const TEMP_DIR: &str = "temp";

/// Errors that can occur while locating or creating a workspace.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// No `.chai` directory exists in the start directory or any parent.
    #[error(
        "no workspace: could not find .chai in {} or any parent directory",
        start.display()
    )]
    NotFound {
        /// The directory the search started from.
        start: PathBuf,
    },

    /// A project name that cannot be used as a single directory component.
    #[error("invalid project name '{0}'")]
    InvalidProjectName(String),

    /// An I/O error occurred while creating workspace directories.
    #[error("workspace I/O error at {}: {source}", path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Walks up from `start` looking for the nearest `.chai` marker directory.
///
/// Returns the path of the marker directory itself, or `None` once the
/// filesystem root has been checked.
pub fn find_build_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(MARKER_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// A resolved workspace rooted at a `.chai` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Locates the workspace enclosing `start`.
    pub fn discover(start: &Path) -> Result<Self, WorkspaceError> {
        find_build_root(start)
            .map(|root| Self { root })
            .ok_or_else(|| WorkspaceError::NotFound {
                start: start.to_path_buf(),
            })
    }

    /// Creates a new workspace marker (with `cache/` and `projects/`) inside `dir`.
    ///
    /// Existing directories are left untouched, so this is safe to call on an
    /// already initialized workspace.
    pub fn create(dir: &Path) -> Result<Self, WorkspaceError> {
        let root = dir.join(MARKER_DIR);
        for sub in [CACHE_DIR, PROJECTS_DIR] {
            create_dir(&root.join(sub))?;
        }
        Ok(Self { root })
    }

    /// Creates the build directories for `project` and returns its project directory.
    pub fn create_project(&self, project: &str) -> Result<PathBuf, WorkspaceError> {
        validate_project_name(project)?;
        create_dir(&self.objects_dir(project))?;
        create_dir(&self.executable_dir(project))?;
        Ok(self.project_dir(project))
    }

    /// The `.chai` marker directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory containing the `.chai` marker. Relative source roots are
    /// resolved against it.
    pub fn base_dir(&self) -> &Path {
        self.root.parent().unwrap_or(&self.root)
    }

    /// Path of the persisted build cache shared by every project.
    pub fn cache_file(&self) -> PathBuf {
        self.root.join(CACHE_DIR).join(CACHE_FILE)
    }

    /// Directory holding all project folders.
    pub fn projects_dir(&self) -> PathBuf {
        self.root.join(PROJECTS_DIR)
    }

    /// Directory for a single project.
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.projects_dir().join(project)
    }

    /// The project's persisted layout file.
    pub fn layout_path(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(LAYOUT_FILE)
    }

    /// Returns `true` if a layout file exists for `project`.
    pub fn has_project(&self, project: &str) -> bool {
        self.layout_path(project).is_file()
    }

    /// Working directory for compilation; object artifacts land here.
    pub fn objects_dir(&self, project: &str) -> PathBuf {
        self.project_dir(project).join("build").join("objects")
    }

    /// Transient directory for per-worker expansion output.
    pub fn temp_dir(&self, project: &str) -> PathBuf {
        self.objects_dir(project).join(TEMP_DIR)
    }

    /// Directory receiving the linked executable.
    pub fn executable_dir(&self, project: &str) -> PathBuf {
        self.project_dir(project).join("build").join("executable")
    }

    /// Full path of the linked executable.
    pub fn executable_path(&self, project: &str) -> PathBuf {
        self.executable_dir(project).join(project)
    }
}

/// Rejects names that would escape `projects/` or collide with the filesystem.
fn validate_project_name(project: &str) -> Result<(), WorkspaceError> {
    let ok = !project.is_empty()
        && project != "."
        && project != ".."
        && !project.contains(['/', '\\']);
    if ok {
        Ok(())
    } else {
        Err(WorkspaceError::InvalidProjectName(project.to_string()))
    }
}

fn create_dir(path: &Path) -> Result<(), WorkspaceError> {
    std::fs::create_dir_all(path).map_err(|source| WorkspaceError::Io {
        path: path.to_path_buf(),
        source,
    })
}
