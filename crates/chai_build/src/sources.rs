//! Source discovery and object naming.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::BuildError;

/// Extensions recognized as compilable sources.
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx"];

/// Extension of object artifacts.
pub const OBJECT_EXTENSION: &str = "o";

/// Enumerates every source under the configured `roots`.
///
/// Relative roots are resolved against `base_dir`. A root may be a directory,
/// searched recursively, or a single file. Roots that do not exist are skipped
/// with a warning. The result is sorted and free of repeated paths.
pub fn discover_sources<S: AsRef<str>>(
    base_dir: &Path,
    roots: &[S],
) -> Result<Vec<PathBuf>, BuildError> {
    let mut files = Vec::new();
    for root in roots {
        let path = base_dir.join(root.as_ref());
        if path.is_dir() {
            walk_dir(&path, &mut files)?;
        } else if path.is_file() {
            if is_source_file(&path) {
                files.push(path);
            }
        } else {
            tracing::warn!(root = %path.display(), "source root does not exist");
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Recursively walks a directory collecting source files.
fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), BuildError> {
    let entries = std::fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| BuildError::io(dir, e))?.path();
        if path.is_dir() {
            walk_dir(&path, files)?;
        } else if is_source_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Returns `true` if `path` has one of the [`SOURCE_EXTENSIONS`].
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
}

/// File name of the object artifact compiled from `source`.
fn object_name(source: &Path) -> OsString {
    let mut name = source.file_stem().unwrap_or(source.as_os_str()).to_os_string();
    name.push(".");
    name.push(OBJECT_EXTENSION);
    name
}

/// Path of the object artifact compiled from `source`.
///
/// Objects are named by the source's file stem only, so `src/a.cpp` and
/// `lib/a.cpp` would both map to `a.o`; [`check_duplicates`] rejects that.
pub fn object_path(objects_dir: &Path, source: &Path) -> PathBuf {
    objects_dir.join(object_name(source))
}

/// Fails if two sources would write the same object artifact.
///
/// This covers every pair of sources with identical file names, and also pairs
/// such as `a.c` and `a.cpp`.
pub fn check_duplicates(sources: &[PathBuf]) -> Result<(), BuildError> {
    let mut seen: HashMap<OsString, &PathBuf> = HashMap::with_capacity(sources.len());
    for source in sources {
        if let Some(first) = seen.insert(object_name(source), source) {
            return Err(BuildError::DuplicateSource {
                object: object_name(source).to_string_lossy().into_owned(),
                first: first.clone(),
                second: source.clone(),
            });
        }
    }
    Ok(())
}
