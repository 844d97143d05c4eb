//! `stencil generate` — render and write all documents for a configuration.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use stencil_gen::{pipeline, RunOptions, WriteResult};

/// Arguments for `stencil generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// YAML file(s) or directory(ies) containing the source documents.
    #[arg(short = 'f', long = "filename", required = true, num_args = 1..)]
    pub filenames: Vec<PathBuf>,

    /// Folder to write the rendered documents into (reset on every run).
    #[arg(short, long)]
    pub output: PathBuf,

    /// Directory holding the registered template files.
    #[arg(long, default_value = "./templates")]
    pub templates: PathBuf,

    /// Defaults document merged underneath the sources.
    #[arg(long)]
    pub defaults: Option<PathBuf>,

    /// Team directory file backing the lookup functions.
    #[arg(long)]
    pub teams: Option<PathBuf>,

    /// Directory holding Product/Asset icon assets.
    #[arg(long, default_value = "./icons")]
    pub icons: PathBuf,

    /// Show what would be written without actually writing any files.
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateArgs {
    pub fn run(self) -> Result<()> {
        let opts = RunOptions {
            inputs: self.filenames,
            output: self.output,
            templates: self.templates,
            defaults: self.defaults,
            teams: self.teams,
            icons: self.icons,
            dry_run: self.dry_run,
        };
        let report = pipeline::run(&opts).context("generation failed")?;
        let elapsed = (Utc::now() - report.started_at).num_milliseconds();
        print_report(&report.writes, self.dry_run, elapsed);
        Ok(())
    }
}

fn print_report(writes: &[WriteResult], dry_run: bool, elapsed_ms: i64) {
    let prefix = if dry_run { "[dry-run] " } else { "" };

    if writes.is_empty() {
        println!("{prefix}{} nothing to write — no registered paths matched", "✓".green());
        return;
    }

    let files: BTreeSet<_> = writes.iter().map(WriteResult::path).collect();
    println!(
        "{prefix}{} {} document(s) across {} file(s) in {elapsed_ms}ms",
        "✓".green(),
        writes.len(),
        files.len()
    );
    for w in writes {
        match w {
            WriteResult::Created { path } => println!("  ✎  {}", path.display()),
            WriteResult::Appended { path } => println!("  +  {}", path.display()),
            WriteResult::WouldWrite { path } => println!("  ~  {}", path.display()),
        }
    }
}
