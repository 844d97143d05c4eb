//! Stencil — render per-kind YAML documents from one account configuration.
//!
//! # Usage
//!
//! ```text
//! stencil generate -f <file|dir>... -o <dir> [--templates <dir>] [--defaults <file>]
//!                  [--teams <file>] [--icons <dir>] [--dry-run]
//! stencil validate -f <file|dir>... [--show]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{generate::GenerateArgs, validate::ValidateArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stencil",
    version,
    about = "Render per-kind YAML documents from a hierarchical account configuration",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render every registered template against the merged source document.
    Generate(GenerateArgs),

    /// Load and merge the source documents, reporting validation errors.
    Validate(ValidateArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => args.run(),
        Commands::Validate(args) => args.run(),
    }
}
