//! Lexical analyzer for pipeline configuration text.
//!
//! The lexer splits the source into lines and each non-blank line into
//! [`Token`]s with absolute byte spans. Indentation is measured here so the
//! [`parser`](super::parser) only deals with structure. Comments, blank lines,
//! document markers and block scalar bodies (`|`, `>`) are consumed by the
//! lexer and never reach the parser. Flow collections may span lines; the
//! lexer tracks which brackets are still open from one line to the next.
//!
//! The public entry point is [`tokenize`], which keeps going after a bad line
//! and collects every diagnostic in a single pass.

use std::borrow::Cow;

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, eof, opt, peek, preceded, repeat, terminated},
    error::{ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{none_of, one_of, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{Line, PositionedToken, Token},
};

/// Diagnostic information attached to winnow errors via `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// Line-relative offset where the failing construct starts.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// Header of a block scalar: `|` or `>` with optional chomping and indentation indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockHeader {
    folded: bool,
    chomping: Chomping,
    explicit_indent: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chomping {
    Clip,
    Strip,
    Keep,
}

/// A lexed unit of a line. Block scalar headers are resolved by the lexer
/// once the following lines are known.
#[derive(Debug)]
enum Lexeme<'a> {
    Token(Token<'a>),
    BlockScalar(BlockHeader),
}

fn remaining<'a>(input: &Input<'a>) -> &'a str {
    input.peek_slice(input.eof_offset())
}

/// Parse spaces and tabs between tokens
fn separator<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    take_while(0.., [' ', '\t']).parse_next(input)
}

/// Parse a `-` sequence entry indicator (must be followed by whitespace or end of line)
fn dash<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    terminated('-', peek(alt((one_of([' ', '\t']).void(), eof.void()))))
        .value(Token::Dash)
        .parse_next(input)
}

/// Parse flow collection punctuation
fn flow_indicator<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        ','.value(Token::Comma),
    ))
    .parse_next(input)
}

/// Parse an `&anchor` or `*alias` node property
fn node_property<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let indicator = one_of(['&', '*']).parse_next(input)?;
    let name = take_while(1.., |c: char| {
        !c.is_whitespace() && !matches!(c, ',' | '[' | ']' | '{' | '}')
    })
    .parse_next(input)?;
    Ok(match indicator {
        '&' => Token::Anchor(Cow::Borrowed(name)),
        _ => Token::Alias(Cow::Borrowed(name)),
    })
}

fn hex_char(digits: &str) -> Option<char> {
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(char::from_u32)
}

/// Parse an escape sequence inside a double-quoted scalar
fn escape<'a>(input: &mut Input<'a>) -> IResult<char> {
    let start = input.current_token_start();

    preceded(
        '\\',
        cut_err(alt((
            one_of(['n', 't', 'r', '0', 'a', 'b', 'e', 'f', 'v', '\\', '"', '/', ' ']).map(
                |c| match c {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    'a' => '\u{07}',
                    'b' => '\u{08}',
                    'e' => '\u{1B}',
                    'f' => '\u{0C}',
                    'v' => '\u{0B}',
                    other => other,
                },
            ),
            preceded('x', take_while(2, |c: char| c.is_ascii_hexdigit())).verify_map(hex_char),
            preceded('u', take_while(4, |c: char| c.is_ascii_hexdigit())).verify_map(hex_char),
            preceded('U', take_while(8, |c: char| c.is_ascii_hexdigit())).verify_map(hex_char),
        )))
        .context(LexerDiagnostic {
            code: ErrorCode::E003,
            message: "invalid escape sequence",
            help: Some("valid escapes include `\\n`, `\\t`, `\\\\`, `\\\"`, `\\xNN` and `\\uNNNN`"),
            start,
        }),
    )
    .parse_next(input)
}

/// Parse a double-quoted scalar with escapes
fn double_quoted<'a>(input: &mut Input<'a>) -> IResult<Cow<'a, str>> {
    let start = input.current_token_start();
    '"'.parse_next(input)?;

    cut_err(terminated(
        repeat(0.., alt((escape, none_of(['"', '\\'])))).fold(String::new, |mut acc, ch| {
            acc.push(ch);
            acc
        }),
        '"',
    ))
    .context(LexerDiagnostic {
        code: ErrorCode::E001,
        message: "unterminated quoted scalar",
        help: Some("add the closing `\"` on the same line"),
        start,
    })
    .map(Cow::Owned)
    .parse_next(input)
}

/// Parse a single-quoted scalar where `''` stands for one quote
fn single_quoted<'a>(input: &mut Input<'a>) -> IResult<Cow<'a, str>> {
    let start = input.current_token_start();
    '\''.parse_next(input)?;

    cut_err(terminated(
        repeat(0.., alt(("''".value('\''), none_of(['\''])))).fold(
            String::new,
            |mut acc, ch| {
                acc.push(ch);
                acc
            },
        ),
        '\'',
    ))
    .context(LexerDiagnostic {
        code: ErrorCode::E001,
        message: "unterminated quoted scalar",
        help: Some("add the closing `'` on the same line"),
        start,
    })
    .map(Cow::Owned)
    .parse_next(input)
}

/// Length in bytes of the plain scalar at the start of `rest`.
///
/// A plain scalar ends before `: `, before ` #`, at the end of the line and,
/// inside flow collections, before flow punctuation. Trailing whitespace is
/// not part of the scalar.
fn plain_scalar_len(rest: &str, in_flow: bool) -> usize {
    let bytes = rest.as_bytes();
    let mut end = 0;

    for (i, &b) in bytes.iter().enumerate() {
        let next = bytes.get(i + 1).copied();
        let terminates = match b {
            b':' => match next {
                None | Some(b' ' | b'\t') => true,
                Some(b',' | b'[' | b']' | b'{' | b'}') => in_flow,
                _ => false,
            },
            b'#' => i > 0 && matches!(bytes[i - 1], b' ' | b'\t'),
            b',' | b'[' | b']' | b'{' | b'}' => in_flow,
            _ => false,
        };
        if terminates {
            break;
        }
        if b != b' ' && b != b'\t' {
            end = i + 1;
        }
    }

    end
}

/// Parse a plain (unquoted) scalar
fn plain_scalar<'a>(input: &mut Input<'a>, in_flow: bool) -> IResult<Cow<'a, str>> {
    let len = plain_scalar_len(remaining(input), in_flow);
    if len == 0 {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    Ok(Cow::Borrowed(input.next_slice(len)))
}

/// Consume a `:` mapping indicator directly after a scalar, if present
fn key_indicator(input: &mut Input<'_>, in_flow: bool) -> bool {
    let rest = remaining(input);
    let mut chars = rest.chars();
    if chars.next() != Some(':') {
        return false;
    }
    let is_indicator = match chars.next() {
        None | Some(' ' | '\t') => true,
        Some(',' | ']' | '}') => in_flow,
        _ => false,
    };
    if is_indicator {
        input.next_slice(1);
    }
    is_indicator
}

/// Parse a block scalar header (`|`, `>-`, `|2+`, ...)
///
/// Only matches when nothing but whitespace or a comment follows the header.
fn block_header<'a>(input: &mut Input<'a>) -> IResult<BlockHeader> {
    let checkpoint = input.checkpoint();
    let (indicator, modifiers) = (
        one_of(['|', '>']),
        take_while(0.., |c: char| c == '-' || c == '+' || c.is_ascii_digit()),
    )
        .parse_next(input)?;

    let trailing = remaining(input).trim_start_matches([' ', '\t']);
    if !(trailing.is_empty() || (trailing.starts_with('#') && remaining(input) != trailing)) {
        input.reset(&checkpoint);
        return Err(ErrMode::Backtrack(ContextError::new()));
    }

    let chomping = if modifiers.contains('-') {
        Chomping::Strip
    } else if modifiers.contains('+') {
        Chomping::Keep
    } else {
        Chomping::Clip
    };
    let explicit_indent = modifiers
        .chars()
        .find(|c| c.is_ascii_digit())
        .and_then(|c| c.to_digit(10))
        .map(|d| d as usize);

    Ok(BlockHeader {
        folded: indicator == '>',
        chomping,
        explicit_indent,
    })
}

/// Parse one lexeme of a line
fn lexeme<'a>(input: &mut Input<'a>, in_flow: bool) -> IResult<Lexeme<'a>> {
    if !in_flow {
        if let Some(token) = opt(dash).parse_next(input)? {
            return Ok(Lexeme::Token(token));
        }
        if let Some(header) = opt(block_header).parse_next(input)? {
            return Ok(Lexeme::BlockScalar(header));
        }
    }
    if let Some(token) = opt(flow_indicator).parse_next(input)? {
        return Ok(Lexeme::Token(token));
    }
    if let Some(token) = opt(node_property).parse_next(input)? {
        return Ok(Lexeme::Token(token));
    }

    let scalar = alt((double_quoted, single_quoted, move |i: &mut Input<'a>| {
        plain_scalar(i, in_flow)
    }))
    .parse_next(input)?;

    if key_indicator(input, in_flow) {
        Ok(Lexeme::Token(Token::Key(scalar)))
    } else {
        Ok(Lexeme::Token(Token::Scalar(scalar)))
    }
}

/// Tokens of one line, plus the block scalar header that ends it, if any.
struct LineTokens<'a> {
    tokens: Vec<PositionedToken<'a>>,
    block: Option<(BlockHeader, Span)>,
}

/// Lexer that accumulates lines and diagnostics during tokenization.
struct Lexer<'a> {
    source: &'a str,
    lines: Vec<Line<'a>>,
    /// Offsets of the `[` and `{` not closed yet, innermost last
    open_flows: Vec<usize>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            lines: Vec::new(),
            open_flows: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Split the source into `(start offset, text)` pairs without line terminators.
    fn raw_lines(&self) -> Vec<(usize, &'a str)> {
        let mut raw = Vec::new();
        let mut start = 0;
        for segment in self.source.split('\n') {
            raw.push((start, segment.strip_suffix('\r').unwrap_or(segment)));
            start += segment.len() + 1;
        }
        raw
    }

    fn tokenize(&mut self) {
        let raw = self.raw_lines();
        let mut index = 0;

        while index < raw.len() {
            let (start, text) = raw[index];
            index += 1;

            let indent = text.len() - text.trim_start_matches(' ').len();
            let content = &text[indent..];
            let trimmed = content.trim_start_matches([' ', '\t']);

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let in_flow = !self.open_flows.is_empty();
            if indent == 0 && !in_flow && is_document_marker(content) {
                continue;
            }
            if content.starts_with('\t') && !in_flow {
                let tab = start + indent;
                self.diagnostics.emit(
                    Diagnostic::error("tabs are not allowed in indentation")
                        .with_code(ErrorCode::E004)
                        .with_label(Span::new(tab..tab + 1), ErrorCode::E004.description())
                        .with_help("indent with spaces"),
                );
                continue;
            }

            let open_before = self.open_flows.clone();
            match self.tokenize_line(text, start) {
                Ok(LineTokens { mut tokens, block }) => {
                    if let Some((header, header_span)) = block {
                        let parent_indent = tokens
                            .iter()
                            .rev()
                            .find(|t| matches!(t.token, Token::Key(_)))
                            .map_or(indent, |t| t.span.start() - start);
                        let (value, end, consumed) =
                            block_scalar(&raw[index..], parent_indent, header);
                        index += consumed;
                        let end = end.unwrap_or(header_span.end());
                        tokens.push(PositionedToken::new(
                            Token::Scalar(Cow::Owned(value)),
                            Span::new(header_span.start()..end),
                        ));
                    }
                    self.lines.push(Line {
                        start,
                        indent,
                        tokens,
                    });
                }
                Err(diagnostic) => {
                    self.open_flows = open_before;
                    self.diagnostics.emit(diagnostic);
                }
            }
        }

        if let Some(&open) = self.open_flows.first() {
            self.diagnostics.emit(
                Diagnostic::error("flow collection is never closed")
                    .with_code(ErrorCode::E005)
                    .with_label(Span::new(open..open + 1), "opened here")
                    .with_help("close the collection with `]` or `}`"),
            );
        }
    }

    /// Tokenize the text of a single line starting at absolute offset `base`.
    ///
    /// Updates the set of open flow collections as brackets are seen.
    fn tokenize_line(&mut self, text: &'a str, base: usize) -> Result<LineTokens<'a>, Diagnostic> {
        let mut input = LocatingSlice::new(text);
        let mut tokens = Vec::new();
        let mut block = None;

        loop {
            let _ = separator(&mut input);
            if input.eof_offset() == 0 || remaining(&input).starts_with('#') {
                break;
            }

            let start = input.current_token_start();
            let lexeme = lexeme(&mut input, !self.open_flows.is_empty())
                .map_err(|err| {
                    Self::convert_err_mode(err, text, input.current_token_start(), base)
                })?;
            let mut end = base + input.current_token_start();
            if matches!(lexeme, Lexeme::Token(Token::Key(_))) {
                // The key span stops before the consumed `:`.
                end -= 1;
            }
            let span = Span::new(base + start..end);

            match lexeme {
                Lexeme::Token(token) => {
                    match token {
                        Token::LeftBracket | Token::LeftBrace => self.open_flows.push(span.start()),
                        Token::RightBracket | Token::RightBrace => {
                            self.open_flows.pop();
                        }
                        _ => {}
                    }
                    tokens.push(PositionedToken::new(token, span));
                }
                Lexeme::BlockScalar(header) => {
                    block = Some((header, span));
                    break;
                }
            }
        }

        Ok(LineTokens { tokens, block })
    }

    fn finish(self) -> Result<Vec<Line<'a>>, ParseError> {
        self.diagnostics.finish().map(|()| self.lines)
    }

    /// Convert an ErrMode and line-relative error position in `text` to a Diagnostic.
    ///
    /// Uses the innermost `LexerDiagnostic` context when present and falls
    /// back to E002 (unexpected character).
    fn convert_err_mode(
        err: ErrMode<ContextError<LexerDiagnostic>>,
        text: &str,
        error_pos: usize,
        base: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(base + *start..base + error_pos.max(*start + 1));
            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let width = text
            .get(error_pos..)
            .and_then(|rest| rest.chars().next())
            .map_or(1, char::len_utf8);
        let span = Span::new(base + error_pos..base + error_pos + width);
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
    }
}

fn is_document_marker(content: &str) -> bool {
    content == "---"
        || content.starts_with("--- ")
        || content == "..."
        || content.starts_with("... ")
        || content.starts_with('%')
}

/// Collect the body of a block scalar from the lines following its header.
///
/// Returns the scalar value, the end offset of the last content line and the
/// number of raw lines consumed.
fn block_scalar(
    lines: &[(usize, &str)],
    parent_indent: usize,
    header: BlockHeader,
) -> (String, Option<usize>, usize) {
    let mut content_indent = header.explicit_indent.map(|n| parent_indent + n);
    let mut body: Vec<&str> = Vec::new();
    let mut end = None;
    let mut consumed = 0;

    for &(start, text) in lines {
        if text.trim().is_empty() {
            body.push("");
            consumed += 1;
            continue;
        }
        let indent = text.len() - text.trim_start_matches(' ').len();
        let required = match content_indent {
            Some(required) => required,
            None if indent > parent_indent => {
                content_indent = Some(indent);
                indent
            }
            None => break,
        };
        if indent < required {
            break;
        }
        body.push(&text[required..]);
        end = Some(start + text.len());
        consumed += 1;
    }

    // Trailing blank lines belong to the chomping indicator, not to the body.
    let trailing_blank = body.iter().rev().take_while(|line| line.is_empty()).count();
    let content_lines = &body[..body.len() - trailing_blank];

    let mut value = if header.folded {
        fold_lines(content_lines)
    } else {
        content_lines.join("\n")
    };

    if !content_lines.is_empty() {
        match header.chomping {
            Chomping::Strip => {}
            Chomping::Clip => value.push('\n'),
            Chomping::Keep => {
                value.push('\n');
                value.push_str(&"\n".repeat(trailing_blank));
            }
        }
    }

    // Blank lines after the body are not consumed so the next structure
    // starts on its own line; they carry no tokens anyway.
    let consumed = consumed.min(lines.len());
    (value, end, consumed)
}

/// Fold lines of a `>` block scalar: single line breaks become spaces,
/// empty lines become line breaks.
fn fold_lines(lines: &[&str]) -> String {
    let mut folded = String::new();
    let mut previous_empty = true;
    for line in lines {
        if line.is_empty() {
            folded.push('\n');
            previous_empty = true;
        } else {
            if !previous_empty {
                folded.push(' ');
            }
            folded.push_str(line);
            previous_empty = false;
        }
    }
    folded
}

/// Tokenize a configuration document, collecting multiple errors.
///
/// # Returns
///
/// - `Ok(lines)` - Every non-blank line with its tokens
/// - `Err(ParseError)` - One or more lines could not be tokenized
pub fn tokenize(source: &str) -> Result<Vec<Line<'_>>, ParseError> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize();
    lexer.finish()
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Component names as they appear in collector configurations
    /// (`otlp`, `otlp/2`, `filelog/app_logs`, ...).
    fn component_name_strategy() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,12}(/[a-z0-9_]{1,8})?"
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Component names tokenize as a single scalar inside flow lists.
    fn check_component_names_tokenize(name: &str) -> Result<(), TestCaseError> {
        let source = format!("receivers: [{name}]");
        let lines = tokenize(&source);
        prop_assert!(lines.is_ok(), "Failed to tokenize `{name}`: {:?}", lines.err());

        let lines = lines.unwrap_or_default();
        prop_assert_eq!(
            &lines[0].tokens[2].token,
            &Token::Scalar(Cow::Borrowed(name))
        );
        Ok(())
    }

    /// Arbitrary input never panics, and token spans stay inside the source.
    fn check_spans_within_source(source: &str) -> Result<(), TestCaseError> {
        if let Ok(lines) = tokenize(source) {
            for token in lines.iter().flat_map(|line| &line.tokens) {
                prop_assert!(token.span.end() <= source.len());
                prop_assert!(source.is_char_boundary(token.span.start()));
            }
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn component_names_tokenize(name in component_name_strategy()) {
            check_component_names_tokenize(&name)?;
        }

        #[test]
        fn spans_within_source(source in "[ -~\t\n]{0,200}") {
            check_spans_within_source(&source)?;
        }
    }
}
