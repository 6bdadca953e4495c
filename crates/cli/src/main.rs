// civreg CLI - load the civil registry, reconcile marital status, report
// Reads a workbook (or CSV directory) with women, men and marriage sheets.

mod exit_codes;
mod registry;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "civreg")]
#[command(about = "Civil registry marital-status reconciliation")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reset every status to single, then mark everyone in the marriage log married
    #[command(after_help = "\
Edits are applied before reconciliation, so reconciliation overwrites any
status they set. Ids missing from a registry are reported, not fatal.

Examples:
  civreg reconcile registro_civil.xlsx
  civreg reconcile registro_civil.xlsx --json
  civreg reconcile registro_civil.xlsx --output corregido.xlsx
  civreg reconcile registro_civil.xlsx --edit '21789423:status=Unión Libre'
  civreg reconcile ./csv-export --config registry.toml")]
    Reconcile {
        /// Workbook (.xlsx, .xls, .xlsb, .ods) or directory of <sheet>.csv files
        input: PathBuf,

        /// Registry config (sheet names, column names, labels)
        #[arg(long, short = 'c', env = "CIVREG_CONFIG")]
        config: Option<PathBuf>,

        /// Point edit on a men record before reconciling. Repeatable.
        /// Format: ID:FIELD=VALUE[;FIELD=VALUE], FIELD is last_name, first_name or status
        #[arg(long, value_name = "EDIT")]
        edit: Vec<String>,

        /// Print the report as JSON instead of tables
        #[arg(long)]
        json: bool,

        /// Write the report to a file (.xlsx writes the corrected registry, anything else JSON)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Print both registries as loaded, without reconciling
    #[command(after_help = "\
Examples:
  civreg show registro_civil.xlsx
  civreg show ./csv-export --json")]
    Show {
        /// Workbook or CSV directory
        input: PathBuf,

        #[arg(long, short = 'c', env = "CIVREG_CONFIG")]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Look up one id in both registries (exit 5 if absent from both)
    #[command(after_help = "\
Examples:
  civreg lookup registro_civil.xlsx 21789423")]
    Lookup {
        /// Workbook or CSV directory
        input: PathBuf,

        /// Identifier (DNI)
        id: String,

        #[arg(long, short = 'c', env = "CIVREG_CONFIG")]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Validate a registry config without loading data
    #[command(after_help = "\
Examples:
  civreg validate registry.toml")]
    Validate {
        /// Path to the registry .toml config
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  civreg-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

/// Logs go to stderr so stdout stays clean for tables and JSON.
/// `RUST_LOG` overrides the flag-derived level.
fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Reconcile { input, config, edit, json, output } => {
            registry::cmd_reconcile(input, config, edit, json, output)
        }
        Commands::Show { input, config, json } => registry::cmd_show(input, config, json),
        Commands::Lookup { input, id, config, json } => registry::cmd_lookup(input, id, config, json),
        Commands::Validate { config } => registry::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
