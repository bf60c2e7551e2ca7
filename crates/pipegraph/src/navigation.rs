//! Mapping between graph elements and source positions.
//!
//! Graph nodes remember the span of the component name they were created
//! from and pipeline groups the span of their definition, so lookups go both
//! ways: from a node to its `(line, column)` and from a cursor to the
//! innermost pipeline and node around it.

use serde::Serialize;

use pipegraph_parser::{Document, Span, locate::LineIndex};

use crate::structure::ComponentGraph;

/// Graph elements enclosing a cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorTarget {
    pub pipeline: String,
    pub node: Option<String>,
}

/// 1-based position of the component name a node was created from.
pub fn node_position(
    graph: &ComponentGraph,
    lines: &LineIndex<'_>,
    node_id: &str,
) -> Option<(usize, usize)> {
    let node = graph.node(node_id)?;
    Some(lines.position(node.span().start()))
}

/// The pipeline, and node within it, whose source spans contain `offset`.
///
/// Spans include their end offset, so a cursor just after a component name
/// still selects it. Returns `None` outside every pipeline definition.
pub fn element_at(graph: &ComponentGraph, offset: usize) -> Option<CursorTarget> {
    let group = graph
        .groups()
        .iter()
        .filter(|group| group.span().contains(offset))
        .min_by_key(|group| group.span().len())?;

    let node = graph
        .nodes()
        .iter()
        .filter(|node| node.pipeline_id() == group.id() && node.span().contains(offset))
        .min_by_key(|node| node.span().len())
        .map(|node| node.id().to_string());

    Some(CursorTarget {
        pipeline: group.id().to_string(),
        node,
    })
}

/// Like [`element_at`], for a 1-based `(line, column)` cursor.
pub fn element_at_position(
    graph: &ComponentGraph,
    lines: &LineIndex<'_>,
    line: usize,
    column: usize,
) -> Option<CursorTarget> {
    element_at(graph, lines.offset(line, column)?)
}

/// Span of the element a path of keys and sequence indices leads to.
///
/// The walk stops at the deepest element found; `None` means not even the
/// first segment exists.
pub fn resolve_path<S: AsRef<str>>(document: &Document, segments: &[S]) -> Option<Span> {
    document.resolve_path(segments)
}
