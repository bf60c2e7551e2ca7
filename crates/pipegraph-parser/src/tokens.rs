//! Token definitions produced by the [`lexer`](super::lexer).

use std::{borrow::Cow, fmt};

use crate::span::Span;

/// A single lexical token of a configuration line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'src> {
    /// `-` sequence entry indicator
    Dash,
    /// A scalar immediately followed by `:`; the colon is consumed
    Key(Cow<'src, str>),
    /// A plain, quoted or block scalar, unquoted and unescaped
    Scalar(Cow<'src, str>),
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `,`
    Comma,
    /// `&name` node anchor
    Anchor(Cow<'src, str>),
    /// `*name` reference to an anchored node
    Alias(Cow<'src, str>),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Dash => write!(f, "-"),
            Token::Key(key) => write!(f, "{key}:"),
            Token::Scalar(value) => write!(f, "{value}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Anchor(name) => write!(f, "&{name}"),
            Token::Alias(name) => write!(f, "*{name}"),
        }
    }
}

/// A token together with its absolute position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

/// A non-blank source line split into tokens.
///
/// Blank lines, comment-only lines, document markers and block scalar
/// content lines never produce a `Line`.
#[derive(Debug, Clone)]
pub struct Line<'src> {
    /// Offset of the first byte of the line
    pub start: usize,
    /// Number of leading spaces
    pub indent: usize,
    pub tokens: Vec<PositionedToken<'src>>,
}

impl Line<'_> {
    /// Column (0-based, in bytes) of the token at `index`.
    pub fn column_of(&self, index: usize) -> usize {
        self.tokens
            .get(index)
            .map_or(self.indent, |token| token.span.start() - self.start)
    }
}
