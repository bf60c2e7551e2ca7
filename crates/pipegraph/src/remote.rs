//! Handling of responses from an external distribution validator.
//!
//! Only the response contract is handled here; issuing the request is left to
//! the host. A response is either
//!
//! ```json
//! {"message": "Configuration is valid"}
//! ```
//!
//! or a rejection carrying an `error` and optionally the `path` of section
//! names that locates the offending element.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use pipegraph_parser::{Diagnostic, Document, ErrorCode, Span};

/// Message sent by the validator for an accepted configuration.
pub const VALID_MESSAGE: &str = "Configuration is valid";

/// One segment of a validator path: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(index) => write!(f, "{index}"),
            PathSegment::Key(key) => f.write_str(key),
        }
    }
}

/// A validator response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteVerdict {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
}

impl RemoteVerdict {
    /// Parses a JSON response body.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// A response without an `error` accepts the configuration.
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Path segments as strings, empty when the response has no path.
    pub fn path_segments(&self) -> Vec<String> {
        self.path
            .iter()
            .flatten()
            .map(ToString::to_string)
            .collect()
    }

    /// Converts a rejection into an `E500` error positioned at the element
    /// named by `path`, or at the document start when the path does not
    /// resolve. Accepting verdicts yield `None`.
    pub fn to_diagnostic(&self, document: Option<&Document>) -> Option<Diagnostic> {
        let error = self.error.as_deref()?;
        let segments = self.path_segments();
        let resolved = document.and_then(|document| document.resolve_path(&segments));
        debug!(
            segments = segments.len(),
            resolved = resolved.is_some();
            "Positioning validator error"
        );

        let label = if segments.is_empty() {
            "reported by the distribution validator".to_string()
        } else {
            format!("at `{}`", segments.join("."))
        };
        let message = if self.message.is_empty() {
            error.to_string()
        } else {
            format!("{}: {error}", self.message)
        };

        Some(
            Diagnostic::error(message)
                .with_code(ErrorCode::E500)
                .with_label(resolved.unwrap_or(Span::empty(0)), label),
        )
    }
}

/// Ticket identifying one validation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Last-write-wins bookkeeping for validation requests.
///
/// Every request takes a ticket from [`RequestTracker::begin`]; when its
/// response arrives, [`RequestTracker::accept`] tells whether it is still the
/// newest request. Superseded responses are dropped, never cancelled.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    /// True only for the most recently issued ticket.
    pub fn accept(&self, ticket: Ticket) -> bool {
        self.latest != 0 && ticket.0 == self.latest
    }

    pub fn latest(&self) -> Option<Ticket> {
        (self.latest != 0).then_some(Ticket(self.latest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipegraph_parser::parse_document;

    #[test]
    fn test_valid_response() {
        let verdict = RemoteVerdict::from_json(r#"{"message":"Configuration is valid"}"#).unwrap();
        assert!(verdict.is_valid());
        assert_eq!(verdict.message, VALID_MESSAGE);
        assert!(verdict.to_diagnostic(None).is_none());
    }

    #[test]
    fn test_rejection_is_positioned_by_path() {
        let source = "exporters:\n  otlp:\n    endpoint: x\n";
        let document = parse_document(source).unwrap();
        let verdict = RemoteVerdict::from_json(
            r#"{"message":"Invalid configuration","error":"missing tls","path":["exporters","otlp"]}"#,
        )
        .unwrap();
        assert!(!verdict.is_valid());

        let diagnostic = verdict.to_diagnostic(Some(&document)).unwrap();
        assert_eq!(diagnostic.code(), Some(ErrorCode::E500));
        assert!(diagnostic.severity().is_error());
        assert_eq!(diagnostic.message(), "Invalid configuration: missing tls");
        assert_eq!(
            diagnostic.primary_span(),
            Some(Span::new(13..17))
        );
    }

    #[test]
    fn test_unresolvable_path_points_at_document_start() {
        let document = parse_document("receivers:\n").unwrap();
        let verdict = RemoteVerdict::from_json(
            r#"{"message":"","error":"bad","path":["service", 0]}"#,
        )
        .unwrap();
        assert_eq!(verdict.path_segments(), vec!["service", "0"]);
        let diagnostic = verdict.to_diagnostic(Some(&document)).unwrap();
        assert_eq!(diagnostic.message(), "bad");
        assert_eq!(diagnostic.primary_span(), Some(Span::empty(0)));
    }

    #[test]
    fn test_request_tracker_last_write_wins() {
        let mut tracker = RequestTracker::new();
        assert_eq!(tracker.latest(), None);

        let first = tracker.begin();
        assert!(tracker.accept(first));

        let second = tracker.begin();
        assert!(second > first);
        assert!(!tracker.accept(first));
        assert!(tracker.accept(second));
        assert_eq!(tracker.latest(), Some(second));
    }
}
