//! Error codes for the Pipegraph diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Structure errors
//! - `E2xx` - Reference errors
//! - `E3xx` - Graph construction anomalies
//! - `E4xx` - Cycle analysis
//! - `E5xx` - Distribution validator results

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated quoted scalar.
    ///
    /// A scalar was opened with `"` or `'` but never closed on the same line.
    E001,

    /// Unexpected character.
    ///
    /// A character was encountered that cannot start a token.
    E002,

    /// Invalid escape sequence.
    ///
    /// An unrecognized escape was used inside a double-quoted scalar.
    E003,

    /// Tab used for indentation.
    ///
    /// Indentation must use spaces only.
    E004,

    /// Unterminated flow collection.
    ///
    /// A `[` or `{` was not closed before the end of the document.
    E005,

    // =========================================================================
    // Structure Errors (E1xx)
    // =========================================================================
    /// Unexpected indentation.
    ///
    /// A line is indented deeper than its context allows.
    E100,

    /// Expected a mapping key.
    ///
    /// A line inside a mapping does not start with `key:`.
    E101,

    /// Expected a sequence entry.
    ///
    /// A line inside a sequence does not start with `- `.
    E102,

    /// Nested mapping on a single line.
    ///
    /// A second `key:` follows a key on the same line (`a: b: c`).
    E103,

    /// Unexpected flow token.
    ///
    /// A `]`, `}` or `,` appeared where no flow collection is open, or a flow
    /// collection is followed by more content.
    E104,

    /// Nesting too deep.
    ///
    /// Collections are nested deeper than the tree builder accepts.
    E105,

    /// Undefined alias.
    ///
    /// A `*name` alias does not follow a matching `&name` anchor.
    E106,

    /// Alias expansion too large.
    ///
    /// Expanding aliases would copy more nodes than the tree builder accepts.
    E107,

    // =========================================================================
    // Reference Errors (E2xx)
    // =========================================================================
    /// Undefined component.
    ///
    /// A pipeline or the service references a component that is not declared.
    E200,

    /// Unused component.
    ///
    /// A component is declared but never referenced.
    E201,

    // =========================================================================
    // Graph Anomalies (E3xx)
    // =========================================================================
    /// Pipeline without receivers.
    E300,

    /// Pipeline without exporters.
    E301,

    /// Malformed pipeline definition.
    ///
    /// The pipeline value is not a mapping of component lists.
    E302,

    // =========================================================================
    // Cycle Analysis (E4xx)
    // =========================================================================
    /// Cycle enumeration truncated.
    ///
    /// The number of simple cycles exceeded the configured limit.
    E400,

    // =========================================================================
    // Distribution Validator (E5xx)
    // =========================================================================
    /// Configuration rejected by the distribution validator.
    E500,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E106 => "E106",
            ErrorCode::E107 => "E107",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E400 => "E400",
            ErrorCode::E500 => "E500",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated quoted scalar",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "tab indentation",
            ErrorCode::E005 => "unterminated flow collection",
            ErrorCode::E100 => "unexpected indentation",
            ErrorCode::E101 => "expected mapping key",
            ErrorCode::E102 => "expected sequence entry",
            ErrorCode::E103 => "nested mapping on one line",
            ErrorCode::E104 => "unexpected flow token",
            ErrorCode::E105 => "nesting too deep",
            ErrorCode::E106 => "undefined alias",
            ErrorCode::E107 => "alias expansion too large",
            ErrorCode::E200 => "undefined component",
            ErrorCode::E201 => "unused component",
            ErrorCode::E300 => "pipeline without receivers",
            ErrorCode::E301 => "pipeline without exporters",
            ErrorCode::E302 => "malformed pipeline",
            ErrorCode::E400 => "cycle enumeration truncated",
            ErrorCode::E500 => "rejected by distribution validator",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E200.to_string(), "E200");
        assert_eq!(ErrorCode::E500.to_string(), "E500");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E004.description(), "tab indentation");
        assert_eq!(ErrorCode::E201.description(), "unused component");
        assert_eq!(ErrorCode::E105.description(), "nesting too deep");
    }
}
