//! Test doubles shared by the build engine's unit tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chai_common::Workspace;
use chai_config::{write_project, LayoutField, ProjectLayout};
use tempfile::TempDir;

use crate::toolchain::{Toolchain, ToolchainError};

/// A toolchain that never spawns a process.
///
/// Expansion drops `//` comment lines, so comment-only edits do not change the
/// fingerprint. Compilation copies the source into the object file; linking
/// writes the object list to the output. Every call is recorded.
#[derive(Default)]
pub(crate) struct FakeToolchain {
    expanded: Mutex<Vec<PathBuf>>,
    compiled: Mutex<Vec<PathBuf>>,
    linked: Mutex<Vec<Vec<PathBuf>>>,
    fail_compile: Option<&'static str>,
    fail_link: bool,
    silent_expand: Option<&'static str>,
}

impl FakeToolchain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fails compilation of any source with file name `name`.
    pub(crate) fn failing_compile(name: &'static str) -> Self {
        Self {
            fail_compile: Some(name),
            ..Self::default()
        }
    }

    pub(crate) fn failing_link() -> Self {
        Self {
            fail_link: true,
            ..Self::default()
        }
    }

    /// Reports success when expanding `name` but writes no output.
    pub(crate) fn silent_expand(name: &'static str) -> Self {
        Self {
            silent_expand: Some(name),
            ..Self::default()
        }
    }

    pub(crate) fn expanded(&self) -> Vec<PathBuf> {
        self.expanded.lock().unwrap().clone()
    }

    pub(crate) fn compiled(&self) -> Vec<PathBuf> {
        let mut compiled = self.compiled.lock().unwrap().clone();
        compiled.sort();
        compiled
    }

    pub(crate) fn compile_count(&self) -> usize {
        self.compiled.lock().unwrap().len()
    }

    pub(crate) fn links(&self) -> Vec<Vec<PathBuf>> {
        self.linked.lock().unwrap().clone()
    }
}

fn io_failure(command: &str, path: &Path, source: std::io::Error) -> ToolchainError {
    ToolchainError::Spawn {
        command: format!("{command} {}", path.display()),
        source,
    }
}

impl Toolchain for FakeToolchain {
    fn expand(&self, source: &Path, output: &Path) -> Result<(), ToolchainError> {
        self.expanded.lock().unwrap().push(source.to_path_buf());
        if self
            .silent_expand
            .is_some_and(|name| source.file_name().is_some_and(|f| f == name))
        {
            return Ok(());
        }
        let text = fs::read_to_string(source).map_err(|e| io_failure("fake -E", source, e))?;
        let expanded: String = text
            .lines()
            .filter(|line| !line.trim_start().starts_with("//"))
            .map(|line| format!("{}\n", line.trim_end()))
            .collect();
        fs::write(output, expanded).map_err(|e| io_failure("fake -E", output, e))
    }

    fn compile(&self, source: &Path, object: &Path) -> Result<(), ToolchainError> {
        self.compiled.lock().unwrap().push(source.to_path_buf());
        if self
            .fail_compile
            .is_some_and(|name| source.file_name().is_some_and(|f| f == name))
        {
            return Err(ToolchainError::Failed {
                command: format!("fake -c {}", source.display()),
                code: Some(1),
            });
        }
        fs::copy(source, object).map_err(|e| io_failure("fake -c", object, e))?;
        Ok(())
    }

    fn link(&self, objects: &[PathBuf], output: &Path) -> Result<(), ToolchainError> {
        self.linked.lock().unwrap().push(objects.to_vec());
        if self.fail_link {
            return Err(ToolchainError::Failed {
                command: format!("fake -o {}", output.display()),
                code: Some(1),
            });
        }
        let listing: String = objects
            .iter()
            .map(|o| format!("{}\n", o.display()))
            .collect();
        fs::write(output, listing).map_err(|e| io_failure("fake -o", output, e))
    }
}

/// A temporary workspace holding one project named `app` with sources under `src/`.
pub(crate) struct Fixture {
    _dir: TempDir,
    pub(crate) workspace: Workspace,
    pub(crate) layout: ProjectLayout,
}

pub(crate) const PROJECT: &str = "app";

impl Fixture {
    pub(crate) fn new(threads: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::create(dir.path()).unwrap();
        workspace.create_project(PROJECT).unwrap();
        let mut layout = ProjectLayout::default_for_new_project();
        layout.push(LayoutField::Sources, "src").unwrap();
        layout
            .set(LayoutField::Threads, &threads.to_string())
            .unwrap();
        write_project(&workspace, PROJECT, &layout).unwrap();
        fs::create_dir_all(workspace.base_dir().join("src")).unwrap();
        Self {
            _dir: dir,
            workspace,
            layout,
        }
    }

    /// Writes `content` to `relative` under the workspace base directory.
    pub(crate) fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.workspace.base_dir().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub(crate) fn object(&self, name: &str) -> PathBuf {
        self.workspace.objects_dir(PROJECT).join(name)
    }

    pub(crate) fn cache_bytes(&self) -> Vec<u8> {
        fs::read(self.workspace.cache_file()).unwrap()
    }
}
