//! `chai run` and `chai debug`: launching the linked executable.

use std::path::{Path, PathBuf};
use std::process::Command;

use chai_common::Workspace;
use chai_config::read_project;

use crate::{ExecArgs, GlobalArgs};

/// Runs the project's executable with the given arguments.
///
/// Returns the executable's exit code, or 1 if it was killed by a signal.
pub fn run(
    cwd: &Path,
    args: &ExecArgs,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let workspace = Workspace::discover(cwd)?;
    let exe = built_executable(&workspace, &args.project)?;

    if !global.quiet {
        eprintln!("     Running `{}`", exe.display());
    }
    let status = Command::new(&exe)
        .args(&args.args)
        .status()
        .map_err(|e| format!("failed to launch {}: {e}", exe.display()))?;
    Ok(status.code().unwrap_or(1))
}

/// Launches the configured debugger on the project's executable.
///
/// Arguments for the executable are handed over with `--args`, which gdb and
/// lldb both accept.
pub fn debug(
    cwd: &Path,
    args: &ExecArgs,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let workspace = Workspace::discover(cwd)?;
    let layout = read_project(&workspace, &args.project)?;
    let debugger = layout.debugger()?;
    let exe = built_executable(&workspace, &args.project)?;

    let mut command = Command::new(debugger);
    if !args.args.is_empty() {
        command.arg("--args");
    }
    command.arg(&exe).args(&args.args);

    if !global.quiet {
        eprintln!("   Debugging `{}` with {debugger}", exe.display());
    }
    let status = command
        .status()
        .map_err(|e| format!("failed to launch debugger '{debugger}': {e}"))?;
    Ok(status.code().unwrap_or(1))
}

fn built_executable(workspace: &Workspace, project: &str) -> Result<PathBuf, String> {
    let exe = workspace.executable_path(project);
    if exe.is_file() {
        Ok(exe)
    } else {
        Err(format!(
            "no executable for project '{project}' at {}; run `chai build {project}` first",
            exe.display()
        ))
    }
}
