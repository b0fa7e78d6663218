//! `chai build`: incremental parallel build of one project.

use std::path::Path;

use chai_build::BuildReport;
use chai_common::Workspace;

use crate::GlobalArgs;

/// Runs the `chai build` command.
///
/// Returns exit code 0 if every source compiled and the link succeeded, 1 if
/// any source failed. Fatal errors (bad layout, duplicate sources, link
/// failure) are returned as `Err`.
pub fn run(
    cwd: &Path,
    project: &str,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let workspace = Workspace::discover(cwd)?;
    tracing::debug!(root = %workspace.root().display(), "resolved workspace");

    if !global.quiet {
        eprintln!("   Building {project}");
    }

    let report = chai_build::build(&workspace, project)?;
    report_build(&report, workspace.base_dir(), global);

    Ok(if report.succeeded() { 0 } else { 1 })
}

/// Prints per-source results and a one-line summary to stderr.
///
/// Failures are always printed; everything else is suppressed by `--quiet`.
fn report_build(report: &BuildReport, base_dir: &Path, global: &GlobalArgs) {
    for failed in &report.failed {
        eprintln!(
            "error: could not compile {}: {}",
            relative(&failed.source, base_dir),
            failed.reason
        );
    }
    if global.quiet {
        return;
    }

    for source in &report.compiled {
        eprintln!("    Compiled {}", relative(source, base_dir));
    }
    if global.verbose {
        for source in &report.fresh {
            eprintln!("     Fresh {}", relative(source, base_dir));
        }
    }
    eprintln!(
        "      Linked {} ({} objects)",
        relative(&report.executable, base_dir),
        report.objects_linked
    );
    eprintln!("{}", summary(report));
}

fn summary(report: &BuildReport) -> String {
    format!(
        "    Finished {}: {} compiled, {} up to date, {} failed",
        report.project,
        report.compiled.len(),
        report.fresh.len(),
        report.failed.len()
    )
}

fn relative(path: &Path, base_dir: &Path) -> String {
    path.strip_prefix(base_dir)
        .unwrap_or(path)
        .display()
        .to_string()
}
