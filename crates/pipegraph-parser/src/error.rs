//! Error and diagnostic system for the Pipegraph parser.
//!
//! This module provides:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels
//! - A collector for accumulating several diagnostics in one pass
//!
//! # Example
//!
//! ```
//! # use pipegraph_parser::error::{Diagnostic, ErrorCode};
//! # use pipegraph_parser::Span;
//!
//! let diag = Diagnostic::error("receiver `otlp/2` is not defined")
//!     .with_code(ErrorCode::E200)
//!     .with_label(Span::new(120..126), "referenced here")
//!     .with_help("declare it under `receivers` or `connectors`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
