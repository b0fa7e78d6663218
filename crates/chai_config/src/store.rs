//! Project layout persistence.
//!
//! Each project stores its layout as `projects/<name>/project_layout`, one
//! `key = "space separated values"` line per field. The file is a TOML document
//! whose values are all basic strings, which also accepts the compact
//! `key="..."` spelling written by earlier versions.

use std::collections::BTreeMap;
use std::path::Path;

use chai_common::Workspace;

use crate::error::ConfigError;
use crate::layout::ProjectLayout;

/// Reads a layout file.
pub fn read_layout(path: &Path) -> Result<ProjectLayout, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    read_layout_from_str(&content)
}

/// Parses layout file content.
///
/// Useful for testing without filesystem dependencies.
pub fn read_layout_from_str(content: &str) -> Result<ProjectLayout, ConfigError> {
    let entries: BTreeMap<String, String> =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    Ok(ProjectLayout::from_entries(entries))
}

/// Writes a layout file in full, returning the number of keys written.
pub fn write_layout(path: &Path, layout: &ProjectLayout) -> Result<usize, ConfigError> {
    let entries = layout.to_entries();
    let content =
        toml::to_string(&entries).map_err(|e| ConfigError::SerializeError(e.to_string()))?;
    std::fs::write(path, content)?;
    Ok(entries.len())
}

/// Reads the layout of `project` within `workspace`.
pub fn read_project(workspace: &Workspace, project: &str) -> Result<ProjectLayout, ConfigError> {
    if !workspace.has_project(project) {
        return Err(ConfigError::UnknownProject(project.to_string()));
    }
    read_layout(&workspace.layout_path(project))
}

/// Writes the layout of `project`, creating its directory if needed.
pub fn write_project(
    workspace: &Workspace,
    project: &str,
    layout: &ProjectLayout,
) -> Result<usize, ConfigError> {
    let path = workspace.layout_path(project);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_layout(&path, layout)
}
