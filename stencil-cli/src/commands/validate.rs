//! `stencil validate` — load and merge sources without rendering anything.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_yaml::Value;

use stencil_core::source;

/// Arguments for `stencil validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// YAML file(s) or directory(ies) containing the source documents.
    #[arg(short = 'f', long = "filename", required = true, num_args = 1..)]
    pub filenames: Vec<PathBuf>,

    /// Also print the merged document.
    #[arg(long)]
    pub show: bool,
}

impl ValidateArgs {
    pub fn run(self) -> Result<()> {
        let combined = source::load_and_validate(&self.filenames).context("validation failed")?;
        println!(
            "{} {} top-level key(s) merged cleanly",
            "✓".green(),
            combined.len()
        );
        if self.show {
            let yaml = serde_yaml::to_string(&Value::Mapping(combined))
                .context("failed to serialize merged document")?;
            print!("{yaml}");
        }
        Ok(())
    }
}
