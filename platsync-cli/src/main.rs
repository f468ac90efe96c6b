//! platsync: keep platform environments and local working copies in step.
//!
//! # Usage
//!
//! ```text
//! platsync branch [<id>] [<parent>] [--title T] [--force] [--no-clone-parent] [--no-wait]
//! platsync checkout <id>
//! platsync deploy [--environment E] [--app A]... [--db-sync] [--no-sanitize] [--directory D]
//! ```
//!
//! Every command takes `--project`, or reads `PLATSYNC_PROJECT`.

mod commands;
mod http;
mod selection;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{branch::BranchArgs, checkout::CheckoutArgs, deploy::DeployArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "platsync",
    version,
    about = "Branch platform environments and deploy sites locally",
    long_about = None,
)]
struct Cli {
    /// Increase log output (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Branch an environment and check the new branch out locally.
    Branch(BranchArgs),

    /// Check out an existing environment in the local working copy.
    Checkout(CheckoutArgs),

    /// Deploy a Drupal site locally, fetching it on first use.
    Deploy(DeployArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Branch(args) => args.run(),
        Commands::Checkout(args) => args.run(),
        Commands::Deploy(args) => args.run(),
    }
}
