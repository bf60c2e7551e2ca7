//! Parsed document tree.
//!
//! A [`Document`] is an ordered forest of [`Item`]s. Every key and every
//! value keeps the byte span it was parsed from, so any element can be
//! mapped back to the source text.

use crate::span::{Span, Spanned};

/// A value in the document tree.
#[derive(Debug, Clone)]
pub enum Value {
    /// A key with no value (`key:`); the span is empty and sits after the colon
    Null(Span),
    Scalar(Spanned<String>),
    Mapping(Spanned<Vec<Item>>),
    Sequence(Spanned<Vec<Value>>),
}

impl Value {
    pub fn span(&self) -> Span {
        match self {
            Value::Null(span) => *span,
            Value::Scalar(scalar) => scalar.span(),
            Value::Mapping(mapping) => mapping.span(),
            Value::Sequence(sequence) => sequence.span(),
        }
    }

    /// Byte offset where the value starts.
    pub fn offset(&self) -> usize {
        self.span().start()
    }

    pub fn as_scalar(&self) -> Option<&Spanned<String>> {
        match self {
            Value::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[Item]> {
        match self {
            Value::Mapping(mapping) => Some(mapping.inner()),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(sequence) => Some(sequence.inner()),
            _ => None,
        }
    }

    /// Looks up `key` when this value is a mapping.
    ///
    /// When the key is repeated the last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&Item> {
        self.as_mapping().and_then(|items| find_last(items, key))
    }

    /// Short name of the value kind, used in messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null(_) => "null",
            Value::Scalar(_) => "scalar",
            Value::Mapping(_) => "mapping",
            Value::Sequence(_) => "sequence",
        }
    }
}

/// A keyed entry of a mapping.
#[derive(Debug, Clone)]
pub struct Item {
    pub key: Spanned<String>,
    pub value: Value,
}

impl Item {
    pub fn new(key: Spanned<String>, value: Value) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &str {
        self.key.inner()
    }

    pub fn key_offset(&self) -> usize {
        self.key.offset()
    }

    pub fn value_offset(&self) -> usize {
        self.value.offset()
    }

    /// Span from the start of the key to the end of the value.
    pub fn span(&self) -> Span {
        self.key.span().union(self.value.span())
    }
}

fn find_last<'a>(items: &'a [Item], key: &str) -> Option<&'a Item> {
    items.iter().rev().find(|item| item.key() == key)
}

/// The root forest of a parsed configuration.
#[derive(Debug, Clone, Default)]
pub struct Document {
    items: Vec<Item>,
    source_len: usize,
}

impl Document {
    pub fn new(items: Vec<Item>, source_len: usize) -> Self {
        Self { items, source_len }
    }

    /// Top-level items in document order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Length in bytes of the text the document was parsed from.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Looks up a top-level key; the last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&Item> {
        find_last(&self.items, key)
    }

    /// Follows a chain of mapping keys from the root.
    ///
    /// ```
    /// # use pipegraph_parser::parse_document;
    /// let doc = parse_document("service:\n  pipelines:\n    traces: {}\n").unwrap();
    /// assert!(doc.lookup(&["service", "pipelines", "traces"]).is_some());
    /// assert!(doc.lookup(&["service", "extensions"]).is_none());
    /// ```
    pub fn lookup(&self, keys: &[&str]) -> Option<&Item> {
        let (first, rest) = keys.split_first()?;
        rest.iter()
            .try_fold(self.get(first)?, |item, key| item.value.get(key))
    }

    /// Resolves a path of segments to the span of the deepest element found.
    ///
    /// Mapping segments match keys; sequence segments match either an index
    /// or a scalar entry. Returns `None` when not even the first segment
    /// exists. A mapping key resolves to the key's span, a sequence entry to
    /// the entry's span.
    pub fn resolve_path<S: AsRef<str>>(&self, segments: &[S]) -> Option<Span> {
        let (first, rest) = segments.split_first()?;
        let item = self.get(first.as_ref())?;

        let mut span = item.key.span();
        let mut current = &item.value;
        for segment in rest {
            let segment = segment.as_ref();
            match current {
                Value::Mapping(mapping) => match find_last(mapping.inner(), segment) {
                    Some(item) => {
                        span = item.key.span();
                        current = &item.value;
                    }
                    None => break,
                },
                Value::Sequence(sequence) => {
                    let entries = sequence.inner();
                    let entry = match segment.parse::<usize>() {
                        Ok(index) => entries.get(index),
                        Err(_) => entries.iter().find(|entry| {
                            entry
                                .as_scalar()
                                .is_some_and(|scalar| scalar.inner() == segment)
                        }),
                    };
                    match entry {
                        Some(entry) => {
                            span = entry.span();
                            current = entry;
                        }
                        None => break,
                    }
                }
                Value::Null(_) | Value::Scalar(_) => break,
            }
        }

        Some(span)
    }
}
