//! chai CLI: the command-line interface for the chai build tool.
//!
//! Provides `chai init` for workspace and project scaffolding, `chai build`
//! for incremental parallel builds, `chai run` and `chai debug` for launching
//! the result, and `info`, `reset`, `add`, `remove` and `set` for editing a
//! project's layout.

#![warn(missing_docs)]

mod build;
mod exec;
mod init;
mod settings;

use std::path::Path;
use std::process;
use std::sync::Once;

use chai_config::LayoutField;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// chai: an incremental, parallel C/C++ build tool.
#[derive(Parser, Debug)]
#[command(name = "chai", version, about = "Incremental parallel C/C++ builds")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a project, and the workspace if none encloses the current directory.
    Init {
        /// Project name.
        project: String,
    },
    /// Show a project's layout.
    Info {
        /// Project name.
        project: String,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// Restore a project's default layout.
    Reset {
        /// Project name.
        project: String,
    },
    /// Compile stale sources and link the project.
    Build {
        /// Project name.
        project: String,
    },
    /// Run the project's executable.
    Run(ExecArgs),
    /// Launch the project's executable under the configured debugger.
    Debug(ExecArgs),
    /// Append values to a list field of a project's layout.
    Add(ListEditArgs),
    /// Remove a value from a list field of a project's layout.
    Remove(ListEditArgs),
    /// Replace a single-value field of a project's layout.
    Set(SetArgs),
}

/// Arguments for `chai run` and `chai debug`.
#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Project name.
    pub project: String,

    /// Arguments passed through to the executable.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Arguments for `chai add` and `chai remove`.
#[derive(Args, Debug)]
pub struct ListEditArgs {
    /// Project name.
    pub project: String,

    /// Field to edit.
    #[arg(value_enum)]
    pub field: ListField,

    /// Value to add or remove. `add` accepts several space-separated items.
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

/// Arguments for `chai set`.
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Project name.
    pub project: String,

    /// Field to replace.
    #[arg(value_enum)]
    pub field: SingleField,

    /// New value.
    pub value: String,
}

/// Layout fields holding a list of values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ListField {
    /// Flags for every toolchain invocation.
    CompileFlags,
    /// Flags for macro expansion only.
    HashFlags,
    /// Flags for compilation only.
    ObjectFlags,
    /// Header search directories.
    Headers,
    /// Libraries to link.
    Libraries,
    /// Source files or directories.
    Sources,
}

impl From<ListField> for LayoutField {
    fn from(field: ListField) -> Self {
        match field {
            ListField::CompileFlags => LayoutField::CompileFlags,
            ListField::HashFlags => LayoutField::HashFlags,
            ListField::ObjectFlags => LayoutField::ObjectFlags,
            ListField::Headers => LayoutField::Headers,
            ListField::Libraries => LayoutField::Libraries,
            ListField::Sources => LayoutField::Sources,
        }
    }
}

/// Layout fields holding exactly one value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SingleField {
    /// Compiler driver.
    Compiler,
    /// Debugger program.
    Debugger,
    /// Language standard.
    Standard,
    /// Compile worker count.
    Threads,
}

impl From<SingleField> for LayoutField {
    fn from(field: SingleField) -> Self {
        match field {
            SingleField::Compiler => LayoutField::Compiler,
            SingleField::Debugger => LayoutField::Debugger,
            SingleField::Standard => LayoutField::Standard,
            SingleField::Threads => LayoutField::Threads,
        }
    }
}

/// Layout output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
    };
    init_logging(&global);

    let result = std::env::current_dir()
        .map_err(Into::into)
        .and_then(|cwd| dispatch(cli.command, &cwd, &global));

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn dispatch(
    command: Command,
    cwd: &Path,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    match command {
        Command::Init { project } => init::run(cwd, &project, global),
        Command::Info { project, format } => settings::info(cwd, &project, format),
        Command::Reset { project } => settings::reset(cwd, &project, global),
        Command::Build { project } => build::run(cwd, &project, global),
        Command::Run(ref args) => exec::run(cwd, args, global),
        Command::Debug(ref args) => exec::debug(cwd, args, global),
        Command::Add(ref args) => settings::add(cwd, args, global),
        Command::Remove(ref args) => settings::remove(cwd, args, global),
        Command::Set(ref args) => settings::set(cwd, args, global),
    }
}

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug, `--quiet`
/// selects error, and the default is warn.
fn init_logging(global: &GlobalArgs) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = if std::env::var_os("RUST_LOG").is_some() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(log_level(global))
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    });
}

fn log_level(global: &GlobalArgs) -> &'static str {
    if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["chai", "init", "app"]);
        match cli.command {
            Command::Init { project } => assert_eq!(project, "app"),
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn parse_info_default_text() {
        let cli = Cli::parse_from(["chai", "info", "app"]);
        match cli.command {
            Command::Info { project, format } => {
                assert_eq!(project, "app");
                assert_eq!(format, ReportFormat::Text);
            }
            _ => panic!("expected Info command"),
        }
    }

    #[test]
    fn parse_info_json() {
        let cli = Cli::parse_from(["chai", "info", "app", "--format", "json"]);
        match cli.command {
            Command::Info { format, .. } => assert_eq!(format, ReportFormat::Json),
            _ => panic!("expected Info command"),
        }
    }

    #[test]
    fn parse_build() {
        let cli = Cli::parse_from(["chai", "build", "app"]);
        assert!(matches!(cli.command, Command::Build { ref project } if project == "app"));
    }

    #[test]
    fn parse_run_passes_hyphenated_args() {
        let cli = Cli::parse_from(["chai", "run", "app", "--port", "80", "-v"]);
        match cli.command {
            Command::Run(ref args) => {
                assert_eq!(args.project, "app");
                assert_eq!(args.args, vec!["--port", "80", "-v"]);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn parse_run_without_args() {
        let cli = Cli::parse_from(["chai", "run", "app"]);
        match cli.command {
            Command::Run(ref args) => assert!(args.args.is_empty()),
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn parse_debug() {
        let cli = Cli::parse_from(["chai", "debug", "app", "input.txt"]);
        match cli.command {
            Command::Debug(ref args) => assert_eq!(args.args, vec!["input.txt"]),
            _ => panic!("expected Debug command"),
        }
    }

    #[test]
    fn parse_add_flag_value() {
        let cli = Cli::parse_from(["chai", "add", "app", "compile-flags", "-O2"]);
        match cli.command {
            Command::Add(ref args) => {
                assert_eq!(args.field, ListField::CompileFlags);
                assert_eq!(args.value, "-O2");
                assert_eq!(LayoutField::from(args.field), LayoutField::CompileFlags);
            }
            _ => panic!("expected Add command"),
        }
    }

    #[test]
    fn parse_remove() {
        let cli = Cli::parse_from(["chai", "remove", "app", "libraries", "m"]);
        match cli.command {
            Command::Remove(ref args) => {
                assert_eq!(args.field, ListField::Libraries);
                assert_eq!(args.value, "m");
            }
            _ => panic!("expected Remove command"),
        }
    }

    #[test]
    fn parse_set_threads() {
        let cli = Cli::parse_from(["chai", "set", "app", "threads", "8"]);
        match cli.command {
            Command::Set(ref args) => {
                assert_eq!(args.field, SingleField::Threads);
                assert_eq!(LayoutField::from(args.field), LayoutField::Threads);
                assert_eq!(args.value, "8");
            }
            _ => panic!("expected Set command"),
        }
    }

    #[test]
    fn set_rejects_list_fields() {
        assert!(Cli::try_parse_from(["chai", "set", "app", "sources", "src"]).is_err());
    }

    #[test]
    fn add_rejects_single_fields() {
        assert!(Cli::try_parse_from(["chai", "add", "app", "compiler", "clang++"]).is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["chai", "build", "app", "--quiet"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_verbose_flag() {
        let cli = Cli::parse_from(["chai", "--verbose", "info", "app"]);
        assert!(cli.verbose);
        assert!(!cli.quiet);
    }

    #[test]
    fn log_level_follows_flags() {
        let level = |quiet, verbose| log_level(&GlobalArgs { quiet, verbose });
        assert_eq!(level(false, false), "warn");
        assert_eq!(level(true, false), "error");
        assert_eq!(level(false, true), "debug");
    }

    #[test]
    fn every_field_maps_to_distinct_layout_field() {
        let mut keys: Vec<_> = ListField::value_variants()
            .iter()
            .map(|f| LayoutField::from(*f))
            .chain(SingleField::value_variants().iter().map(|f| LayoutField::from(*f)))
            .map(LayoutField::key)
            .collect();
        keys.sort();
        let expected: Vec<_> = LayoutField::ALL.iter().map(|f| f.key()).collect();
        assert_eq!(keys, expected);
    }
}
