//! Node placement inside one pipeline group.
//!
//! Columns run left to right: receivers, each processor in chain order, then
//! exporters. Empty roles take no column. Each column is centered vertically
//! within the tallest one.

use pipegraph_core::{
    component::Role,
    geometry::{Insets, Point, Size},
};

use crate::structure::PipelineGroup;

/// Size of a group and the centers of its nodes relative to the group's
/// top-left corner.
#[derive(Debug, Clone)]
pub(super) struct GroupShape {
    size: Size,
    node_centers: Vec<(usize, Point)>,
}

impl GroupShape {
    pub(super) fn size(&self) -> Size {
        self.size
    }

    /// `(node index, center)` pairs.
    pub(super) fn node_centers(&self) -> &[(usize, Point)] {
        &self.node_centers
    }
}

pub(super) fn measure_group(
    group: &PipelineGroup,
    node_size: Size,
    spacing: f32,
    padding: Insets,
) -> GroupShape {
    let mut columns: Vec<Vec<usize>> = Vec::new();
    for role in Role::PIPELINE {
        let nodes = group.nodes(role);
        if nodes.is_empty() {
            continue;
        }
        if role == Role::Processors {
            columns.extend(nodes.iter().map(|&node| vec![node]));
        } else {
            columns.push(nodes.to_vec());
        }
    }

    if columns.is_empty() {
        return GroupShape {
            size: node_size.add_padding(padding),
            node_centers: Vec::new(),
        };
    }

    let extent = |count: usize, length: f32| count as f32 * length + (count - 1) as f32 * spacing;
    let rows = columns.iter().map(Vec::len).max().unwrap_or(1);
    let content = Size::new(
        extent(columns.len(), node_size.width()),
        extent(rows, node_size.height()),
    );

    let mut node_centers = Vec::new();
    for (column_index, column) in columns.iter().enumerate() {
        let x = padding.left()
            + column_index as f32 * (node_size.width() + spacing)
            + node_size.width() / 2.0;
        let top = padding.top() + (content.height() - extent(column.len(), node_size.height())) / 2.0;
        for (row, &node) in column.iter().enumerate() {
            let y = top + row as f32 * (node_size.height() + spacing) + node_size.height() / 2.0;
            node_centers.push((node, Point::new(x, y)));
        }
    }

    GroupShape {
        size: content.add_padding(padding),
        node_centers,
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use pipegraph_parser::{extract_references, parse_document};

    use super::*;
    use crate::structure::build_graphs;

    fn shape(source: &str) -> GroupShape {
        let document = parse_document(source).unwrap();
        let (graph, _, _) = build_graphs(&extract_references(&document));
        measure_group(
            &graph.groups()[0],
            Size::new(160.0, 40.0),
            24.0,
            Insets::uniform(20.0),
        )
    }

    #[test]
    fn test_columns_follow_roles() {
        let shape = shape(
            "service:\n  pipelines:\n    traces:\n      receivers: [a, b]\n      processors: [p]\n      exporters: [e]\n",
        );

        assert!(approx_eq!(f32, shape.size().width(), 568.0));
        assert!(approx_eq!(f32, shape.size().height(), 144.0));

        let centers = shape.node_centers();
        assert_eq!(centers.len(), 4);
        assert_eq!(centers[0].0, 0);
        assert!(approx_eq!(f32, centers[0].1.x(), 100.0));
        assert!(approx_eq!(f32, centers[0].1.y(), 40.0));
        assert!(approx_eq!(f32, centers[1].1.y(), 104.0));
        assert!(approx_eq!(f32, centers[2].1.x(), 284.0));
        assert!(approx_eq!(f32, centers[2].1.y(), 72.0));
    }

    #[test]
    fn test_empty_group_keeps_minimum_size() {
        let shape = shape("service:\n  pipelines:\n    traces: {}\n");
        assert!(shape.node_centers().is_empty());
        assert!(approx_eq!(f32, shape.size().width(), 200.0));
        assert!(approx_eq!(f32, shape.size().height(), 80.0));
    }
}
