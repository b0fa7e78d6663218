//! The end-to-end build of one project.

use std::path::{Path, PathBuf};

use chai_cache::BuildCache;
use chai_common::Workspace;
use chai_config::{read_project, LayoutField, ProjectLayout};

use crate::error::BuildError;
use crate::link::{collect_objects, link};
use crate::scheduler::{FailedSource, Scheduler};
use crate::sources::{check_duplicates, discover_sources};
use crate::toolchain::{ShellToolchain, Toolchain};

/// Summary of a finished build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// The project that was built.
    pub project: String,
    /// Sources recompiled in this build.
    pub compiled: Vec<PathBuf>,
    /// Sources whose cached object was reused.
    pub fresh: Vec<PathBuf>,
    /// Sources that failed to expand or compile.
    pub failed: Vec<FailedSource>,
    /// Number of objects passed to the linker.
    pub objects_linked: usize,
    /// The linked executable.
    pub executable: PathBuf,
    /// Entries in the flushed build cache.
    pub cache_entries: usize,
}

impl BuildReport {
    /// Returns `true` if every source compiled or was already current.
    pub fn succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builds `project` with the compiler named in its layout.
pub fn build(workspace: &Workspace, project: &str) -> Result<BuildReport, BuildError> {
    let layout = read_project(workspace, project)?;
    layout.validate_for_build()?;
    let toolchain = ShellToolchain::from_layout(
        &layout,
        workspace.base_dir(),
        &workspace.objects_dir(project),
    )?;
    build_with(workspace, project, &layout, &toolchain)
}

/// Builds `project` from an already loaded layout using `toolchain`.
///
/// Layout, workspace and duplicate-source errors abort before anything is
/// compiled and leave the cache file untouched. Once compilation has run, the
/// cache is flushed even if linking fails; the link error is returned after.
pub fn build_with(
    workspace: &Workspace,
    project: &str,
    layout: &ProjectLayout,
    toolchain: &dyn Toolchain,
) -> Result<BuildReport, BuildError> {
    layout.validate_for_build()?;
    let workers = layout.threads()?;
    let mut cache = BuildCache::load(&workspace.cache_file())?;

    let sources = discover_sources(workspace.base_dir(), layout.get(LayoutField::Sources))?;
    check_duplicates(&sources)?;
    tracing::info!(project, sources = sources.len(), "starting build");

    let objects_dir = workspace.objects_dir(project);
    let temp_dir = workspace.temp_dir(project);
    std::fs::create_dir_all(&objects_dir).map_err(|e| BuildError::io(&objects_dir, e))?;

    let schedule =
        Scheduler::new(toolchain, &objects_dir, &temp_dir, workers).run(sources, &mut cache);
    remove_temp_dir(&temp_dir);
    let schedule = schedule?;

    let executable = workspace.executable_path(project);
    let linked = collect_objects(&objects_dir)
        .and_then(|objects| link(toolchain, &objects, &executable).map(|()| objects.len()));

    let cache_entries = cache.flush()?;
    let objects_linked = linked?;

    tracing::info!(
        project,
        compiled = schedule.compiled.len(),
        fresh = schedule.fresh.len(),
        failed = schedule.failed.len(),
        "build finished"
    );

    Ok(BuildReport {
        project: project.to_string(),
        compiled: schedule.compiled,
        fresh: schedule.fresh,
        failed: schedule.failed,
        objects_linked,
        executable,
        cache_entries,
    })
}

fn remove_temp_dir(dir: &Path) {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to remove temp directory")
        }
    }
}
