mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use docxref::diagnostics;
use docxref::error::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Environment variable holding the log filter, e.g. `DOCXREF_LOG=debug`.
const LOG_ENV: &str = "DOCXREF_LOG";

/// Top-level CLI.
#[derive(Parser)]
#[command(name = "docxref", about = "Resolve cross-references in document trees", version)]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Resolve every document and report references or targets that fail
    Check {
        /// Directory holding the `*.json` documents and `.docxref.toml`
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Resolve every document and write the result as JSON
    Resolve {
        /// Write one file per document under this directory instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Directory holding the `*.json` documents and `.docxref.toml`
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// List the selectors every document registers
    Targets {
        /// Directory holding the `*.json` documents and `.docxref.toml`
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

/// Install the stderr subscriber, filtered by `DOCXREF_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| return EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
    return;
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    return match cli.command {
        Commands::Check { root } => handle(commands::check(&root)),
        Commands::Resolve { out, root } => handle(commands::resolve(&root, out.as_deref()).map(|()| return ExitCode::SUCCESS)),
        Commands::Targets { root } => handle(commands::targets(&root).map(|()| return ExitCode::SUCCESS)),
    };
}

/// Map a command result to an exit code, rendering hard errors on stderr.
/// Hard errors exit with 2 so they stay distinguishable from diagnostics (1).
fn handle(result: Result<ExitCode, Error>) -> ExitCode {
    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            return ExitCode::from(2);
        },
    };
}
