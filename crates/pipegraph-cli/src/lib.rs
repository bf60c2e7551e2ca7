//! Pipegraph CLI library
//!
//! This module contains the core CLI logic for the Pipegraph analyzer.

pub mod error_adapter;

mod args;
mod config;
mod report;

pub use args::Args;

use std::{fs, io};

use log::{info, warn};

use pipegraph::{Analyzer, PipegraphError, remote::RemoteVerdict, state::EditorState};

/// Run the Pipegraph CLI application
///
/// This function analyzes the input configuration, prints its warnings and
/// writes the laid-out graph as JSON to the output file, or to stdout when
/// no output file is given.
///
/// # Errors
///
/// Returns `PipegraphError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Error-severity diagnostics in the input (as [`PipegraphError::Parse`])
/// - Layout errors
pub fn run(args: &Args) -> Result<(), PipegraphError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Processing configuration"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if args.distribution_validation {
        app_config.validation_mut().set_distribution_validation(true);
    }

    let source = fs::read_to_string(&args.input)?;

    let analyzer = Analyzer::new(app_config);
    let mut analysis = analyzer.analyze(&source)?;

    if let Some(path) = &args.verdict {
        let body = fs::read_to_string(path)?;
        let verdict = RemoteVerdict::from_json(&body).map_err(io::Error::from)?;
        analyzer.apply_remote_verdict(&mut analysis, &verdict);
    }

    for reportable in error_adapter::warnings(&analysis) {
        warn!("{}", error_adapter::render(&reportable));
    }

    if let Some(json) = report::to_json(&analysis)? {
        match &args.output {
            Some(output) => {
                fs::write(output, json)?;
                info!(output_file = output; "Graph exported successfully");
            }
            None => println!("{json}"),
        }
    }

    if args.share {
        println!("#{}", EditorState::new(source.as_str()).encode());
    }

    analysis.ensure_valid()
}
