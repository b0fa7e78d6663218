//! `chai init`: workspace and project scaffolding.
//!
//! Reuses the nearest enclosing `.chai` workspace or creates one in the
//! current directory, then lays out `projects/<name>/build/{objects,executable}`
//! and writes the default project layout.

use std::path::Path;

use chai_common::{Workspace, WorkspaceError};
use chai_config::{write_project, ProjectLayout};

use crate::GlobalArgs;

/// Runs the `chai init` command from `cwd`.
///
/// Returns exit code 0 on success. An existing project is never overwritten.
pub fn run(
    cwd: &Path,
    project: &str,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let workspace = match Workspace::discover(cwd) {
        Ok(workspace) => workspace,
        Err(WorkspaceError::NotFound { .. }) => {
            let workspace = Workspace::create(cwd)?;
            if !global.quiet {
                eprintln!("     Created workspace {}", workspace.root().display());
            }
            workspace
        }
        Err(e) => return Err(e.into()),
    };

    if workspace.has_project(project) {
        return Err(format!(
            "project '{project}' already exists; use `chai reset {project}` to restore its defaults"
        )
        .into());
    }

    if !global.quiet {
        eprintln!("  Creating chai project `{project}`");
    }

    workspace.create_project(project)?;
    write_project(&workspace, project, &ProjectLayout::default_for_new_project())?;

    if !global.quiet {
        eprintln!("     Created {}", workspace.layout_path(project).display());
    }

    Ok(0)
}
