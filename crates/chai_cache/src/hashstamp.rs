//! Fingerprint cache keyed by absolute source path.
//!
//! Persisted as `cache/hashstamps`, one `path=fingerprint` line per entry in
//! path order. The whole file is loaded once at the start of a build, mutated
//! in memory, and rewritten in full by [`BuildCache::flush`].

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chai_common::Fingerprint;

use crate::error::CacheError;

/// Suffix of the sibling file written before the atomic rename.
const TEMP_SUFFIX: &str = "tmp";

/// In-memory working copy of the persisted fingerprint cache.
///
/// An entry for a path records the fingerprint of its expanded content at the
/// most recent successful compile. A missing entry means the source was never
/// compiled successfully.
#[derive(Debug, Clone)]
pub struct BuildCache {
    /// Location of the persisted cache file.
    path: PathBuf,

    /// Fingerprint per absolute source path.
    entries: BTreeMap<PathBuf, Fingerprint>,
}

impl BuildCache {
    /// Creates an empty cache that will flush to `path`.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: BTreeMap::new(),
        }
    }

    /// Loads the cache persisted at `path`.
    ///
    /// A missing file yields an empty cache. Lines that do not parse are
    /// skipped with a warning so that their sources are simply rebuilt.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::new(path)),
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut cache = Self::new(path);
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(line) {
                Some((source, fingerprint)) => {
                    cache.entries.insert(source, fingerprint);
                }
                None => tracing::warn!(
                    cache = %path.display(),
                    line = number + 1,
                    "skipping malformed cache entry"
                ),
            }
        }
        tracing::debug!(entries = cache.entries.len(), "loaded build cache");
        Ok(cache)
    }

    /// Returns the stored fingerprint for `source`.
    pub fn get(&self, source: &Path) -> Option<Fingerprint> {
        self.entries.get(source).copied()
    }

    /// Returns `true` if `source` must be recompiled.
    ///
    /// A source is stale when it has no entry, when its stored fingerprint
    /// differs from `fingerprint`, or when its object artifact is missing.
    pub fn is_stale(&self, source: &Path, fingerprint: Fingerprint, object: &Path) -> bool {
        self.get(source) != Some(fingerprint) || !object.exists()
    }

    /// Records `fingerprint` for `source`, overwriting any previous entry.
    pub fn update(&mut self, source: PathBuf, fingerprint: Fingerprint) {
        self.entries.insert(source, fingerprint);
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Location of the persisted cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the persisted cache with the full in-memory contents.
    ///
    /// The file is written beside the target and renamed over it, so a reader
    /// never observes a partially written cache. Returns the number of entries
    /// written.
    pub fn flush(&self) -> Result<usize, CacheError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| CacheError::Io { path, source }
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        let mut content = String::new();
        for (source, fingerprint) in &self.entries {
            content.push_str(&format!("{}={}\n", source.display(), fingerprint));
        }

        let temp = self.path.with_extension(TEMP_SUFFIX);
        std::fs::write(&temp, content).map_err(io_err(&temp))?;
        std::fs::rename(&temp, &self.path).map_err(io_err(&self.path))?;

        tracing::debug!(entries = self.entries.len(), "flushed build cache");
        Ok(self.entries.len())
    }
}

/// Splits `path=fingerprint` on the last `=`, since paths may contain `=`.
fn parse_line(line: &str) -> Option<(PathBuf, Fingerprint)> {
    let (path, value) = line.rsplit_once('=')?;
    if path.is_empty() {
        return None;
    }
    let fingerprint = value.parse().ok()?;
    Some((PathBuf::from(path), fingerprint))
}
