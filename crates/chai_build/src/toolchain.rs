//! The toolchain boundary: macro expansion, compilation and linking.
//!
//! The build engine only talks to a [`Toolchain`]. [`ShellToolchain`] is the
//! real implementation; it builds each invocation from the project layout with
//! a [`CommandTemplate`] and runs it through the platform shell.

use std::path::{Path, PathBuf};
use std::process::Command;

use chai_config::{ConfigError, LayoutField, ProjectLayout};

use crate::command::{CommandTemplate, TemplateError};

/// Errors from a single toolchain invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// The command line could not be built.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The shell could not be started.
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        /// The command line.
        command: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The command ran but did not succeed.
    #[error("`{command}` failed ({})", describe_exit(*code))]
    Failed {
        /// The command line.
        command: String,
        /// Exit code, if the process exited normally.
        code: Option<i32>,
    },

    /// The command succeeded but did not write its expected output.
    #[error("`{command}` produced no output at {}", path.display())]
    MissingOutput {
        /// The command line.
        command: String,
        /// The expected output path.
        path: PathBuf,
    },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// The three toolchain stages the build engine drives.
///
/// Implementations are shared by every compile worker, so they must be `Sync`.
pub trait Toolchain: Sync {
    /// Writes the macro-expanded text of `source` to `output`.
    fn expand(&self, source: &Path, output: &Path) -> Result<(), ToolchainError>;

    /// Compiles `source` into the object artifact `object`.
    fn compile(&self, source: &Path, object: &Path) -> Result<(), ToolchainError>;

    /// Links `objects` into the executable `output`.
    fn link(&self, objects: &[PathBuf], output: &Path) -> Result<(), ToolchainError>;
}

/// Runs the configured compiler through the platform shell.
///
/// Commands run with the objects directory as their working directory. Paths
/// substituted into templates are shell-quoted; layout values are inserted as
/// written, so flags may use shell syntax.
#[derive(Debug, Clone)]
pub struct ShellToolchain {
    expand: CommandTemplate,
    compile: CommandTemplate,
    link: CommandTemplate,
    working_dir: PathBuf,
}

impl ShellToolchain {
    /// Builds the expand, compile and link templates from a layout.
    ///
    /// Relative header directories are resolved against `base_dir`, since the
    /// commands run from `working_dir`.
    pub fn from_layout(
        layout: &ProjectLayout,
        base_dir: &Path,
        working_dir: &Path,
    ) -> Result<Self, ConfigError> {
        let compiler = layout.compiler()?;
        let standard = format!("-std={}", layout.standard()?);
        let flags = layout.get(LayoutField::CompileFlags);
        let headers: Vec<String> = layout
            .get(LayoutField::Headers)
            .iter()
            .map(|h| quote(&base_dir.join(h).to_string_lossy()))
            .collect();

        let expand = CommandTemplate::program(compiler)
            .arg("-E")
            .args(flags)
            .args(layout.get(LayoutField::HashFlags))
            .prefixed("-I", &headers)
            .placeholder()
            .arg(&standard)
            .arg("-o")
            .placeholder();

        let compile = CommandTemplate::program(compiler)
            .arg("-c")
            .args(flags)
            .args(layout.get(LayoutField::ObjectFlags))
            .prefixed("-I", &headers)
            .placeholder()
            .arg(&standard)
            .arg("-o")
            .placeholder();

        let link = CommandTemplate::program(compiler)
            .args(flags)
            .prefixed("-I", &headers)
            .placeholder()
            .arg("-o")
            .placeholder()
            .prefixed("-l", layout.get(LayoutField::Libraries))
            .arg(&standard);

        Ok(Self {
            expand,
            compile,
            link,
            working_dir: working_dir.to_path_buf(),
        })
    }

    /// The macro-expansion command for `source`.
    pub fn expand_command(&self, source: &Path, output: &Path) -> Result<String, TemplateError> {
        self.expand.render(&[quote_path(source), quote_path(output)])
    }

    /// The compile command for `source`.
    pub fn compile_command(&self, source: &Path, object: &Path) -> Result<String, TemplateError> {
        self.compile.render(&[quote_path(source), quote_path(object)])
    }

    /// The link command for `objects`.
    pub fn link_command(
        &self,
        objects: &[PathBuf],
        output: &Path,
    ) -> Result<String, TemplateError> {
        let objects: Vec<String> = objects.iter().map(|o| quote_path(o)).collect();
        self.link.render(&[objects.join(" "), quote_path(output)])
    }

    fn run(&self, command: &str) -> Result<(), ToolchainError> {
        run_shell(command, &self.working_dir)
    }
}

impl Toolchain for ShellToolchain {
    fn expand(&self, source: &Path, output: &Path) -> Result<(), ToolchainError> {
        let command = self.expand_command(source, output)?;
        self.run(&command)?;
        if !output.exists() {
            return Err(ToolchainError::MissingOutput {
                command,
                path: output.to_path_buf(),
            });
        }
        Ok(())
    }

    fn compile(&self, source: &Path, object: &Path) -> Result<(), ToolchainError> {
        let command = self.compile_command(source, object)?;
        self.run(&command)
    }

    fn link(&self, objects: &[PathBuf], output: &Path) -> Result<(), ToolchainError> {
        let command = self.link_command(objects, output)?;
        self.run(&command)
    }
}

/// Runs `command` through the platform shell in `dir`, inheriting stdio.
pub(crate) fn run_shell(command: &str, dir: &Path) -> Result<(), ToolchainError> {
    tracing::debug!(%command, "running toolchain");
    let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
    let status = Command::new(shell)
        .arg(flag)
        .arg(command)
        .current_dir(dir)
        .status()
        .map_err(|source| ToolchainError::Spawn {
            command: command.to_string(),
            source,
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(ToolchainError::Failed {
            command: command.to_string(),
            code: status.code(),
        })
    }
}

fn quote_path(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

/// Quotes a word for the shell unless it only uses characters that are safe bare.
fn quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:+,@%".contains(c));
    if safe {
        word.to_string()
    } else if cfg!(windows) {
        format!("\"{}\"", word.replace('"', "\\\""))
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
