//! Error types for Pipegraph operations.
//!
//! This module provides the main error type [`PipegraphError`] which wraps
//! the error conditions that can occur while analyzing a configuration.
//! Problems found *in* a configuration (undefined components, structural
//! parse errors, anomalies) are reported as markers on an
//! [`Analysis`](crate::Analysis); this type is for failures of the analysis
//! itself and of the surrounding I/O.

use std::io;

use thiserror::Error;

use pipegraph_parser::error::ParseError;

use crate::state::StateError;

/// The main error type for Pipegraph operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries structured diagnostics together with the
/// source text, so adapters can render labelled snippets.
#[derive(Debug, Error)]
pub enum PipegraphError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("State error: {0}")]
    State(#[from] StateError),
}

impl PipegraphError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
