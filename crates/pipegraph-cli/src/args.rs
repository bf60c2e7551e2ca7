//! Command-line argument definitions for the Pipegraph CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, validation switches and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Pipegraph analyzer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input collector configuration
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output JSON file; the graph is printed when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Suppress unused-component warnings, as an external distribution
    /// validator is responsible for them
    #[arg(long)]
    pub distribution_validation: bool,

    /// JSON response of a distribution validator to merge into the report
    #[arg(long)]
    pub verdict: Option<String>,

    /// Print a shareable URL fragment encoding the input
    #[arg(long)]
    pub share: bool,
}
