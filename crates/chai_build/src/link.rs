//! Linking the project's objects into its executable.

use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::sources::OBJECT_EXTENSION;
use crate::toolchain::Toolchain;

/// Lists every object artifact directly inside `objects_dir`, sorted by path.
///
/// Subdirectories (such as the per-worker temp directory) are not searched.
pub fn collect_objects(objects_dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let entries = std::fs::read_dir(objects_dir).map_err(|e| BuildError::io(objects_dir, e))?;
    let mut objects = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BuildError::io(objects_dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == OBJECT_EXTENSION) {
            objects.push(path);
        }
    }
    objects.sort();
    Ok(objects)
}

/// Links `objects` into `output` with a single toolchain invocation.
pub fn link(
    toolchain: &dyn Toolchain,
    objects: &[PathBuf],
    output: &Path,
) -> Result<(), BuildError> {
    if objects.is_empty() {
        return Err(BuildError::NothingToLink {
            output: output.to_path_buf(),
        });
    }
    if let Some(dir) = output.parent() {
        std::fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
    }
    tracing::info!(objects = objects.len(), output = %output.display(), "linking");
    toolchain
        .link(objects, output)
        .map_err(BuildError::Link)
}
