//! Layout commands: `chai info`, `chai reset`, `chai add`, `chai remove` and `chai set`.

use std::path::Path;

use chai_common::Workspace;
use chai_config::{read_project, write_project, ConfigError, LayoutField, ProjectLayout};

use crate::{GlobalArgs, ListEditArgs, ReportFormat, SetArgs};

/// Prints the layout of `project` to stdout.
pub fn info(
    cwd: &Path,
    project: &str,
    format: ReportFormat,
) -> Result<i32, Box<dyn std::error::Error>> {
    let workspace = Workspace::discover(cwd)?;
    let layout = read_project(&workspace, project)?;
    print!("{}", render_layout(project, &layout, format)?);
    Ok(0)
}

/// Renders a layout as text or JSON.
fn render_layout(
    project: &str,
    layout: &ProjectLayout,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => {
            let mut out = format!("Layout of project {project}:\n");
            for (key, values) in layout.entries() {
                out.push_str("  ");
                out.push_str(key);
                out.push(':');
                for value in values {
                    out.push(' ');
                    out.push_str(value);
                }
                out.push('\n');
            }
            Ok(out)
        }
        ReportFormat::Json => {
            let doc = serde_json::json!({
                "project": project,
                "layout": layout,
            });
            let mut out = serde_json::to_string_pretty(&doc)?;
            out.push('\n');
            Ok(out)
        }
    }
}

/// Rewrites the default layout of an existing project.
pub fn reset(
    cwd: &Path,
    project: &str,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let workspace = Workspace::discover(cwd)?;
    if !workspace.has_project(project) {
        return Err(ConfigError::UnknownProject(project.to_string()).into());
    }
    write_project(&workspace, project, &ProjectLayout::default_for_new_project())?;
    if !global.quiet {
        eprintln!("       Reset {project} to the default layout");
    }
    Ok(0)
}

/// Appends values to a list field.
pub fn add(
    cwd: &Path,
    args: &ListEditArgs,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let field = LayoutField::from(args.field);
    edit(cwd, &args.project, |layout| layout.push(field, &args.value))?;
    if !global.quiet {
        eprintln!("       Added {} to {field}", args.value.trim());
    }
    Ok(0)
}

/// Removes the first occurrence of a value from a list field.
pub fn remove(
    cwd: &Path,
    args: &ListEditArgs,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let field = LayoutField::from(args.field);
    edit(cwd, &args.project, |layout| layout.remove(field, &args.value))?;
    if !global.quiet {
        eprintln!("     Removed {} from {field}", args.value);
    }
    Ok(0)
}

/// Replaces a single-value field.
pub fn set(
    cwd: &Path,
    args: &SetArgs,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let field = LayoutField::from(args.field);
    edit(cwd, &args.project, |layout| layout.set(field, &args.value))?;
    if !global.quiet {
        eprintln!("         Set {field} = {}", args.value.trim());
    }
    Ok(0)
}

/// Loads a project's layout, applies `change`, and writes it back.
///
/// Nothing is written if `change` fails.
fn edit<F>(cwd: &Path, project: &str, change: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&mut ProjectLayout) -> Result<(), ConfigError>,
{
    let workspace = Workspace::discover(cwd)?;
    let mut layout = read_project(&workspace, project)?;
    change(&mut layout)?;
    write_project(&workspace, project, &layout)?;
    Ok(())
}
