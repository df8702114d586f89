//! Command-line flags.

use crate::config::Overrides;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "coverbadge", version)]
#[command(about = "Run a coverage command, read its total and publish it as a badge")]
pub struct Cli {
    /// Whether to write the badge image
    #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
    pub png: Option<bool>,

    /// Badge style: plastic, flat, flat-square, for-the-badge or social
    #[arg(long)]
    pub style: Option<String>,

    /// Comma-separated markdown files whose badge line should be updated
    #[arg(long, value_name = "FILES")]
    pub md: Option<String>,

    /// Text shown before the percentage on the badge
    #[arg(long)]
    pub prefix: Option<String>,

    /// Coverage command to run; must print a coverage total to stdout
    #[arg(long, value_name = "COMMAND")]
    pub covercmd: Option<String>,

    /// Use this coverage value instead of running a command (-1 means unset)
    #[arg(long, allow_negative_numbers = true, value_name = "PERCENT")]
    pub manualcov: Option<f64>,

    /// Build tags for the default coverage command
    #[arg(long)]
    pub tags: Option<String>,

    /// Badge image path
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Give up waiting for a coverage total after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

impl Cli {
    /// Flags as config overrides
    pub fn overrides(&self) -> Overrides {
        Overrides {
            png: self.png,
            style: self.style.clone(),
            md: self.md.clone(),
            prefix: self.prefix.clone(),
            covercmd: self.covercmd.clone(),
            manualcov: self.manualcov,
            tags: self.tags.clone(),
            output: self.output.clone(),
            timeout_seconds: self.timeout,
        }
    }
}
