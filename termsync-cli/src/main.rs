//! termsync: reconcile local translation keys with a remote term project.
//!
//! # Usage
//!
//! ```text
//! termsync plan --keys keys.json [--delete-extraneous] [--lang de ...] [--json] [--out plan.json]
//! termsync sync --keys keys.json [--dry-run] [--batch-size N] [--delay-ms MS]
//!               [--machine-translate [LANGS]] [--isolate-phases] [--json]
//! termsync sync --plan plan.json [--dry-run] ...
//! termsync languages [--json]
//! termsync config [--json]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    config::ConfigArgs, languages::LanguagesArgs, plan::PlanArgs, sync::SyncArgs, Global,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "termsync",
    version,
    about = "Sync local translation keys with a remote translation project",
    long_about = None,
)]
struct Cli {
    /// Config file to use instead of ./termsync.yaml or ~/.termsync/config.yaml.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still wins when set).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute and show the changes a sync would make.
    Plan(PlanArgs),

    /// Push local changes to the remote project.
    Sync(SyncArgs),

    /// List the remote project's languages.
    Languages(LanguagesArgs),

    /// Show the resolved configuration.
    Config(ConfigArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let global = Global {
        config: cli.config,
    };
    match cli.command {
        Commands::Plan(args) => args.run(&global),
        Commands::Sync(args) => args.run(&global),
        Commands::Languages(args) => args.run(&global),
        Commands::Config(args) => args.run(&global),
    }
}

fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
