//! Indentation-driven tree builder.
//!
//! Consumes the [`Line`]s produced by the [`lexer`](super::lexer) and builds
//! the [`Document`] forest. The cursor addresses a token inside a line, so a
//! construct that starts mid-line (`- key: value`) is treated as if it
//! started a line at the token's column.
//!
//! Flow collections are not bound to a line; inside `[...]` and `{...}` the
//! builder reads tokens across lines and ignores indentation.
//!
//! `&name` anchors record the node they label and `*name` aliases copy it.
//! Nesting depth and the number of nodes copied by aliases are bounded.
//!
//! The first structural error aborts the build.

use std::collections::HashMap;

use log::trace;

use crate::{
    document::{Document, Item, Value},
    error::{Diagnostic, ErrorCode},
    span::{Span, Spanned},
    tokens::{Line, PositionedToken, Token},
};

type BuildResult<T> = Result<T, Diagnostic>;

/// Deepest collection nesting the builder accepts.
const MAX_DEPTH: usize = 128;

/// Most nodes that alias expansion may copy into one document.
const MAX_ALIAS_NODES: usize = 100_000;

/// Key whose mapping value is merged into the enclosing mapping.
const MERGE_KEY: &str = "<<";

/// A node labelled with `&name`.
struct Anchored {
    value: Value,
    nodes: usize,
    depth: usize,
}

/// Cursor over the lexed lines of a document.
struct TreeBuilder<'a> {
    lines: Vec<Line<'a>>,
    /// Index of the current line
    line: usize,
    /// Index of the next unconsumed token in the current line
    token: usize,
    /// Line of the most recently consumed token
    last_line: usize,
    /// Number of collections currently being built
    depth: usize,
    anchors: HashMap<String, Anchored>,
    /// Nodes copied so far by alias expansion
    expanded: usize,
}

impl<'a> TreeBuilder<'a> {
    fn new(lines: Vec<Line<'a>>) -> Self {
        let lines = lines
            .into_iter()
            .filter(|line| !line.tokens.is_empty())
            .collect();
        Self {
            lines,
            line: 0,
            token: 0,
            last_line: 0,
            depth: 0,
            anchors: HashMap::new(),
            expanded: 0,
        }
    }

    fn peek(&self) -> Option<&PositionedToken<'a>> {
        self.lines
            .get(self.line)
            .and_then(|line| line.tokens.get(self.token))
    }

    /// Column of the next token, if any.
    fn column(&self) -> Option<usize> {
        let line = self.lines.get(self.line)?;
        (self.token < line.tokens.len()).then(|| line.column_of(self.token))
    }

    fn advance(&mut self) -> Option<PositionedToken<'a>> {
        let line = self.lines.get(self.line)?;
        let token = line.tokens.get(self.token)?.clone();
        self.last_line = self.line;
        self.token += 1;
        if self.token >= line.tokens.len() {
            self.line += 1;
            self.token = 0;
        }
        Some(token)
    }

    /// Whether unconsumed tokens remain on line `line`.
    fn has_more_on(&self, line: usize) -> bool {
        self.line == line && self.peek().is_some()
    }

    /// Run `parse` one nesting level deeper, failing past [`MAX_DEPTH`].
    fn nested<T>(
        &mut self,
        at: Span,
        parse: impl FnOnce(&mut Self) -> BuildResult<T>,
    ) -> BuildResult<T> {
        if self.depth >= MAX_DEPTH {
            return Err(too_deep(at));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_root(&mut self) -> BuildResult<Vec<Item>> {
        let Some(indent) = self.column() else {
            return Ok(Vec::new());
        };

        let is_mapping = matches!(self.peek(), Some(t) if matches!(t.token, Token::Key(_)));
        let items = if is_mapping {
            self.parse_mapping(indent)?.into_inner()
        } else {
            // Non-mapping roots are parsed for structural errors and then dropped.
            let value = self.parse_block(indent, indent)?;
            trace!(kind = value.kind_name(); "Document root is not a mapping");
            Vec::new()
        };

        if let Some(token) = self.peek() {
            return Err(unexpected_indentation(token.span));
        }
        Ok(items)
    }

    /// Parse a block mapping whose keys sit at column `indent`.
    fn parse_mapping(&mut self, indent: usize) -> BuildResult<Spanned<Vec<Item>>> {
        let mut items: Vec<Item> = Vec::new();

        while let Some(column) = self.column() {
            if column < indent {
                break;
            }
            let Some(token) = self.peek().cloned() else {
                break;
            };
            if column > indent {
                return Err(unexpected_indentation(token.span));
            }

            let Token::Key(key) = &token.token else {
                return Err(Diagnostic::error(format!("expected a mapping key, found `{}`", token.token))
                    .with_code(ErrorCode::E101)
                    .with_label(token.span, ErrorCode::E101.description())
                    .with_help("mapping entries are written as `key: value`"));
            };

            let key_line = self.line;
            self.advance();
            let value = self.parse_mapping_value(indent, key_line, token.span)?;
            items.push(Item::new(
                Spanned::new(key.to_string(), token.span),
                value,
            ));
        }

        let span = spanning(items.first().map(Item::span), items.last().map(Item::span));
        Ok(Spanned::new(merge_keys(items), span))
    }

    /// Parse the value following a key at column `indent`.
    fn parse_mapping_value(
        &mut self,
        indent: usize,
        key_line: usize,
        key_span: Span,
    ) -> BuildResult<Value> {
        if self.has_more_on(key_line) {
            let Some(token) = self.peek().cloned() else {
                return Ok(Value::Null(Span::empty(key_span.end() + 1)));
            };
            return match token.token {
                Token::Key(_) => Err(Diagnostic::error("nested mapping on a single line")
                    .with_code(ErrorCode::E103)
                    .with_label(token.span, ErrorCode::E103.description())
                    .with_secondary_label(key_span, "outer key")
                    .with_help("move the nested entry to its own, more indented line")),
                Token::Scalar(_) => self.parse_scalar(indent),
                Token::LeftBracket | Token::LeftBrace => self.parse_inline_flow(),
                Token::Anchor(_) => self.parse_anchored(|builder, _| {
                    builder.parse_mapping_value(indent, key_line, key_span)
                }),
                Token::Alias(_) => self.parse_alias(),
                _ => Err(unexpected_flow_token(&token)),
            };
        }

        match self.column() {
            Some(column) if column > indent => self.parse_block(column, indent),
            Some(column)
                if column == indent
                    && matches!(self.peek(), Some(t) if t.token == Token::Dash) =>
            {
                // Compact sequence at the key's own indentation.
                Ok(Value::Sequence(self.parse_sequence(indent, true)?))
            }
            _ => Ok(Value::Null(Span::empty(key_span.end() + 1))),
        }
    }

    /// Parse a block node starting at the current token, at column `column`,
    /// nested under a parent at column `parent_indent`.
    fn parse_block(&mut self, column: usize, parent_indent: usize) -> BuildResult<Value> {
        let Some(token) = self.peek().cloned() else {
            return Ok(Value::Null(Span::empty(0)));
        };
        self.nested(token.span, |builder| match token.token {
            Token::Dash => Ok(Value::Sequence(builder.parse_sequence(column, false)?)),
            Token::Key(_) => Ok(Value::Mapping(builder.parse_mapping(column)?)),
            Token::Scalar(_) => builder.parse_scalar(parent_indent),
            Token::LeftBracket | Token::LeftBrace => builder.parse_inline_flow(),
            Token::Anchor(_) => builder.parse_anchored(|builder, anchor| {
                match builder.column() {
                    Some(column)
                        if builder.has_more_on(anchor.line) || column > parent_indent =>
                    {
                        builder.parse_block(column, parent_indent)
                    }
                    _ => Ok(Value::Null(Span::empty(anchor.span.end()))),
                }
            }),
            Token::Alias(_) => builder.parse_alias(),
            _ => Err(unexpected_flow_token(&token)),
        })
    }

    /// Consume an `&name` anchor, parse the node it labels with `parse` and
    /// record that node under `name`.
    fn parse_anchored(
        &mut self,
        parse: impl FnOnce(&mut Self, AnchorSite) -> BuildResult<Value>,
    ) -> BuildResult<Value> {
        let line = self.line;
        let Some(anchor) = self.advance() else {
            return Ok(Value::Null(Span::empty(0)));
        };
        let Token::Anchor(name) = &anchor.token else {
            return Err(unexpected_flow_token(&anchor));
        };
        let site = AnchorSite {
            line,
            span: anchor.span,
        };
        let value = self.nested(anchor.span, |builder| parse(builder, site))?;
        Ok(self.define_anchor(name, value))
    }

    fn define_anchor(&mut self, name: &str, value: Value) -> Value {
        let (nodes, depth) = measure(&value);
        trace!(name, nodes, depth; "Anchor defined");
        // A later anchor with the same name replaces the earlier one.
        self.anchors.insert(
            name.to_string(),
            Anchored {
                value: value.clone(),
                nodes,
                depth,
            },
        );
        value
    }

    /// Parse a block `*name` alias, which must end its line.
    fn parse_alias(&mut self) -> BuildResult<Value> {
        let alias_line = self.line;
        let Some(alias) = self.advance() else {
            return Ok(Value::Null(Span::empty(0)));
        };
        let value = self.resolve_alias(&alias)?;
        if self.has_more_on(alias_line) {
            if let Some(next) = self.peek() {
                return Err(unexpected_flow_token(next));
            }
        }
        Ok(value)
    }

    /// Copy of the node anchored under the alias name.
    fn resolve_alias(&mut self, alias: &PositionedToken<'a>) -> BuildResult<Value> {
        let Token::Alias(name) = &alias.token else {
            return Err(unexpected_flow_token(alias));
        };
        let name: &str = name;
        let Some(anchored) = self.anchors.get(name) else {
            return Err(Diagnostic::error(format!("alias `*{name}` has no matching anchor"))
                .with_code(ErrorCode::E106)
                .with_label(alias.span, ErrorCode::E106.description())
                .with_help(format!("define `&{name}` on a node before this alias")));
        };

        if self.depth + anchored.depth > MAX_DEPTH {
            return Err(too_deep(alias.span));
        }
        let expanded = self.expanded + anchored.nodes;
        if expanded > MAX_ALIAS_NODES {
            return Err(Diagnostic::error(format!(
                "aliases expand to more than {MAX_ALIAS_NODES} nodes"
            ))
            .with_code(ErrorCode::E107)
            .with_label(alias.span, ErrorCode::E107.description()));
        }
        let value = anchored.value.clone();
        self.expanded = expanded;
        trace!(name, expanded; "Alias resolved");
        Ok(value)
    }

    /// Parse a block sequence whose dashes sit at column `indent`.
    ///
    /// A compact sequence shares its column with the parent mapping's keys
    /// and ends at the first token that is not a dash.
    fn parse_sequence(&mut self, indent: usize, compact: bool) -> BuildResult<Spanned<Vec<Value>>> {
        let mut entries: Vec<Value> = Vec::new();
        let mut first_dash: Option<Span> = None;
        let mut last_end: Option<Span> = None;

        while let Some(column) = self.column() {
            if column < indent {
                break;
            }
            let Some(token) = self.peek().cloned() else {
                break;
            };
            if column > indent {
                return Err(unexpected_indentation(token.span));
            }
            if token.token != Token::Dash {
                if compact {
                    break;
                }
                return Err(Diagnostic::error(format!(
                    "expected a sequence entry, found `{}`",
                    token.token
                ))
                .with_code(ErrorCode::E102)
                .with_label(token.span, ErrorCode::E102.description())
                .with_help("sequence entries start with `- `"));
            }

            let dash_line = self.line;
            self.advance();
            first_dash.get_or_insert(token.span);

            let value = if self.has_more_on(dash_line) {
                match self.column() {
                    Some(column) => self.parse_block(column, indent)?,
                    None => Value::Null(Span::empty(token.span.end())),
                }
            } else {
                match self.column() {
                    Some(column) if column > indent => self.parse_block(column, indent)?,
                    _ => Value::Null(Span::empty(token.span.end())),
                }
            };

            last_end = Some(value.span().union(token.span));
            entries.push(value);
        }

        let span = spanning(first_dash, last_end);
        Ok(Spanned::new(entries, span))
    }

    /// Parse a scalar, folding in plain continuation lines indented deeper
    /// than `parent_indent`.
    fn parse_scalar(&mut self, parent_indent: usize) -> BuildResult<Value> {
        let scalar_line = self.line;
        let Some(token) = self.advance() else {
            return Ok(Value::Null(Span::empty(0)));
        };
        let mut text = match &token.token {
            Token::Scalar(text) => text.to_string(),
            _ => return Err(unexpected_flow_token(&token)),
        };
        if self.has_more_on(scalar_line) {
            if let Some(next) = self.peek() {
                return Err(unexpected_flow_token(next));
            }
        }

        let mut span = token.span;
        while let Some(line) = self.lines.get(self.line) {
            let continuation = match line.tokens.as_slice() {
                [PositionedToken {
                    token: Token::Scalar(more),
                    span: more_span,
                }] if self.token == 0 && line.indent > parent_indent => Some((more, *more_span)),
                _ => None,
            };
            let Some((more, more_span)) = continuation else {
                break;
            };
            text.push(' ');
            text.push_str(more);
            span = span.union(more_span);
            self.line += 1;
        }

        Ok(Value::Scalar(Spanned::new(text, span)))
    }

    /// Parse a flow collection whose closing bracket must end its line.
    fn parse_inline_flow(&mut self) -> BuildResult<Value> {
        let open = self.peek().map_or(Span::empty(0), |t| t.span);
        let value = self.parse_flow_value(open)?;
        if self.has_more_on(self.last_line) {
            if let Some(next) = self.peek() {
                return Err(unexpected_flow_token(next));
            }
        }
        Ok(value)
    }

    /// Next token of the open collection, or an error at `open` when the
    /// document ended.
    fn flow_token(&mut self, open: Span) -> BuildResult<PositionedToken<'a>> {
        self.advance().ok_or_else(|| {
            Diagnostic::error("flow collection ends unexpectedly")
                .with_code(ErrorCode::E104)
                .with_label(open, "collection opened here")
        })
    }

    fn parse_flow_value(&mut self, open: Span) -> BuildResult<Value> {
        let at = self.peek().map_or(open, |t| t.span);
        self.nested(at, |builder| builder.parse_flow_node(open))
    }

    fn parse_flow_node(&mut self, open: Span) -> BuildResult<Value> {
        let token = self.flow_token(open)?;
        match token.token {
            Token::Scalar(text) => Ok(Value::Scalar(Spanned::new(text.into_owned(), token.span))),
            Token::LeftBracket => self.parse_flow_sequence(token.span),
            Token::LeftBrace => self.parse_flow_mapping(token.span),
            Token::Key(key) => {
                // `[a: 1]` is a single-pair mapping inside a sequence.
                let value = self.parse_flow_entry_value(token.span.end() + 1, open)?;
                let item = Item::new(Spanned::new(key.into_owned(), token.span), value);
                let span = item.span();
                Ok(Value::Mapping(Spanned::new(vec![item], span)))
            }
            Token::Anchor(name) => {
                let value = self.parse_flow_entry_value(token.span.end(), open)?;
                Ok(self.define_anchor(&name, value))
            }
            Token::Alias(_) => self.resolve_alias(&token),
            _ => Err(unexpected_flow_token(&token)),
        }
    }

    /// Value after a flow key or anchor: empty (at `null_at`) before `,` and
    /// closers.
    fn parse_flow_entry_value(&mut self, null_at: usize, open: Span) -> BuildResult<Value> {
        let ends_entry = matches!(
            self.peek().map(|t| &t.token),
            None | Some(Token::Comma | Token::RightBrace | Token::RightBracket)
        );
        if ends_entry {
            return Ok(Value::Null(Span::empty(null_at)));
        }
        self.parse_flow_value(open)
    }

    fn parse_flow_sequence(&mut self, open: Span) -> BuildResult<Value> {
        let mut entries = Vec::new();
        loop {
            if matches!(self.peek().map(|t| &t.token), Some(Token::RightBracket)) {
                let close = self.flow_token(open)?;
                return Ok(Value::Sequence(Spanned::new(entries, open.union(close.span))));
            }
            entries.push(self.parse_flow_value(open)?);

            let separator = self.flow_token(open)?;
            match separator.token {
                Token::Comma => {}
                Token::RightBracket => {
                    return Ok(Value::Sequence(Spanned::new(
                        entries,
                        open.union(separator.span),
                    )));
                }
                _ => return Err(unexpected_flow_token(&separator)),
            }
        }
    }

    fn parse_flow_mapping(&mut self, open: Span) -> BuildResult<Value> {
        let mut items = Vec::new();
        loop {
            let token = self.flow_token(open)?;
            let item = match token.token {
                Token::RightBrace => {
                    return Ok(Value::Mapping(Spanned::new(
                        merge_keys(items),
                        open.union(token.span),
                    )));
                }
                Token::Key(key) => {
                    let value = self.parse_flow_entry_value(token.span.end() + 1, open)?;
                    Item::new(Spanned::new(key.into_owned(), token.span), value)
                }
                // `{a, b}`: keys without values
                Token::Scalar(key) => Item::new(
                    Spanned::new(key.into_owned(), token.span),
                    Value::Null(Span::empty(token.span.end())),
                ),
                _ => return Err(unexpected_flow_token(&token)),
            };
            items.push(item);

            let separator = self.flow_token(open)?;
            match separator.token {
                Token::Comma => {}
                Token::RightBrace => {
                    return Ok(Value::Mapping(Spanned::new(
                        merge_keys(items),
                        open.union(separator.span),
                    )));
                }
                _ => return Err(unexpected_flow_token(&separator)),
            }
        }
    }
}

/// Where an anchor was written.
#[derive(Debug, Clone, Copy)]
struct AnchorSite {
    line: usize,
    span: Span,
}

/// Node count and nesting depth of a value.
fn measure(value: &Value) -> (usize, usize) {
    let children: Vec<(usize, usize)> = match value {
        Value::Mapping(items) => items.inner().iter().map(|item| measure(&item.value)).collect(),
        Value::Sequence(entries) => entries.inner().iter().map(measure).collect(),
        Value::Null(_) | Value::Scalar(_) => Vec::new(),
    };
    let nodes = 1 + children.iter().map(|(nodes, _)| nodes).sum::<usize>();
    let depth = 1 + children.iter().map(|(_, depth)| *depth).max().unwrap_or(0);
    (nodes, depth)
}

/// Resolve `<<` merge keys.
///
/// Entries of the merged mappings are appended unless the mapping already
/// has the key; earlier merge sources win over later ones. A `<<` whose
/// value is not a mapping or a sequence of mappings stays an ordinary entry.
fn merge_keys(items: Vec<Item>) -> Vec<Item> {
    if !items.iter().any(|item| item.key() == MERGE_KEY) {
        return items;
    }

    let mut merged = Vec::with_capacity(items.len());
    let mut sources = Vec::new();
    for item in items {
        let is_merge = item.key() == MERGE_KEY
            && matches!(item.value, Value::Mapping(_) | Value::Sequence(_));
        if is_merge {
            sources.push(item.value);
        } else {
            merged.push(item);
        }
    }

    for source in sources {
        let mappings = match source {
            Value::Mapping(mapping) => vec![mapping.into_inner()],
            Value::Sequence(entries) => entries
                .into_inner()
                .into_iter()
                .filter_map(|entry| match entry {
                    Value::Mapping(mapping) => Some(mapping.into_inner()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        for item in mappings.into_iter().flatten() {
            if !merged.iter().any(|existing: &Item| existing.key() == item.key()) {
                merged.push(item);
            }
        }
    }
    merged
}

/// Span covering `first` through `last`, empty when there are no elements.
fn spanning(first: Option<Span>, last: Option<Span>) -> Span {
    match (first, last) {
        (Some(first), Some(last)) => first.union(last),
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => Span::default(),
    }
}

fn unexpected_indentation(span: Span) -> Diagnostic {
    Diagnostic::error("unexpected indentation")
        .with_code(ErrorCode::E100)
        .with_label(span, ErrorCode::E100.description())
        .with_help("align this line with its siblings or nest it under a key")
}

fn too_deep(span: Span) -> Diagnostic {
    Diagnostic::error(format!("collections are nested deeper than {MAX_DEPTH} levels"))
        .with_code(ErrorCode::E105)
        .with_label(span, ErrorCode::E105.description())
        .with_help("flatten the configuration")
}

fn unexpected_flow_token(token: &PositionedToken<'_>) -> Diagnostic {
    Diagnostic::error(format!("unexpected `{}`", token.token))
        .with_code(ErrorCode::E104)
        .with_label(token.span, ErrorCode::E104.description())
}

/// Build the document tree from lexed lines.
pub(crate) fn build_document(lines: Vec<Line<'_>>, source_len: usize) -> BuildResult<Document> {
    let mut builder = TreeBuilder::new(lines);
    let items = builder.parse_root()?;
    Ok(Document::new(items, source_len))
}
