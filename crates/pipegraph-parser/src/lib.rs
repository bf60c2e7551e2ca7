//! # Pipegraph Parser
//!
//! Offset-preserving parser for collector pipeline configurations, plus the
//! reference extraction and cross-reference validation built on top of it.
//!
//! ## Usage
//!
//! ```
//! # use pipegraph_parser::{parse_document, extract_references, validate_references, ParseError};
//! # use pipegraph_parser::ValidationOptions;
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = "
//! receivers:
//!   otlp:
//! exporters:
//!   debug:
//! service:
//!   pipelines:
//!     traces:
//!       receivers: [otlp]
//!       exporters: [debug]
//! ";
//!
//!     let document = parse_document(source)?;
//!     let references = extract_references(&document);
//!     let findings = validate_references(&references, ValidationOptions::default());
//!     assert!(findings.is_empty());
//!     Ok(())
//! }
//! ```

mod document;
pub mod error;
mod lexer;
pub mod locate;
mod parser;
pub mod references;
mod span;
mod tokens;
pub mod validate;

pub use document::{Document, Item, Value};
pub use error::{Diagnostic, ErrorCode, ParseError, Severity};
pub use references::{ComponentRef, PipelineDefinition, References, extract_references};
pub use span::{Span, Spanned};
pub use validate::{FindingKind, ReferenceFinding, ValidationOptions, validate_references};

use log::{debug, info};

/// Parse configuration text into a [`Document`].
///
/// The pipeline has two steps:
///
/// 1. **Tokenize** - Split lines into positioned tokens, collecting every
///    lexical error
/// 2. **Build** - Assemble mappings and sequences from indentation
///
/// Empty input, or input holding only comments, yields an empty document.
/// A root that is not a mapping also yields an empty document.
///
/// # Errors
///
/// Returns a [`ParseError`] with one or more coded diagnostics when the text
/// is not structurally valid. Consumers usually surface only
/// [`ParseError::primary`].
pub fn parse_document(source: &str) -> Result<Document, ParseError> {
    let lines = lexer::tokenize(source)?;
    debug!(lines = lines.len(); "Tokenized document");

    let document = parser::build_document(lines, source.len())?;
    info!(items = document.items().len(); "Parsed document");

    Ok(document)
}
