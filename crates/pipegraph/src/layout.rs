//! Layered layout of pipeline groups and their component nodes.
//!
//! The engine works in four steps:
//!
//! 1. **Groups** - nodes of each pipeline are placed in columns inside the
//!    pipeline's group rectangle
//! 2. **Ranking** - pipelines are ranked left to right over their acyclic
//!    connector links with the Sugiyama engine; each weakly connected
//!    component is stacked below the previous one and pipelines without
//!    ranked links share a trailing row
//! 3. **Anchoring** - center anchors are converted to top-left rectangles
//! 4. **Routing** - edges become layered polylines, except cyclic connector
//!    edges that point backwards, which are routed below every group as
//!    [`CyclePath`]s

mod group;
mod sugiyama;

use std::collections::HashMap;

use log::{debug, info};
use serde::Serialize;

use pipegraph_core::geometry::{Bounds, Point, Size};

use crate::{
    config::LayoutConfig,
    cycles::CycleSet,
    error::PipegraphError,
    structure::{ComponentGraph, GraphEdge, PipelineGraph},
};

use group::{GroupShape, measure_group};

/// Placement of one pipeline group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupLayout {
    pipeline_id: String,
    bounds: Bounds,
}

impl GroupLayout {
    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    /// Top-left anchored rectangle of the group.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLayout {
    node_id: String,
    bounds: Bounds,
}

impl NodeLayout {
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// Visual type of a routed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    /// Intra-pipeline edge
    Default,
    /// Forward connector edge between pipelines
    Connector,
    /// Connector edge closing a cycle, drawn as a back-edge
    ConnectorCycle,
}

/// Bent path of a back-edge.
///
/// The path leaves the source, drops to `center_y + offset`, runs
/// horizontally through `center_x` and rises into the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CyclePath {
    /// Halfway between the source and target group centers
    pub center_x: f32,
    /// Bottom edge of the lowest group
    pub center_y: f32,
    pub offset: f32,
}

impl CyclePath {
    /// Corner points of the path between `start` and `end`.
    pub fn waypoints(&self, start: Point, end: Point) -> Vec<Point> {
        let floor = self.center_y + self.offset;
        vec![
            start,
            Point::new(start.x(), floor),
            Point::new(self.center_x, floor),
            Point::new(end.x(), floor),
            end,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeRoute {
    Polyline { points: Vec<Point> },
    CyclePath(CyclePath),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeLayout {
    edge_id: String,
    kind: EdgeKind,
    route: EdgeRoute,
}

impl EdgeLayout {
    pub fn edge_id(&self) -> &str {
        &self.edge_id
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn route(&self) -> &EdgeRoute {
        &self.route
    }
}

/// Positions of every group, node and edge.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Layout {
    groups: Vec<GroupLayout>,
    nodes: Vec<NodeLayout>,
    edges: Vec<EdgeLayout>,
    size: Size,
}

impl Layout {
    /// Groups in definition order.
    pub fn groups(&self) -> &[GroupLayout] {
        &self.groups
    }

    pub fn nodes(&self) -> &[NodeLayout] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeLayout] {
        &self.edges
    }

    /// Extent of the drawing, back-edge paths included.
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn group(&self, pipeline_id: &str) -> Option<&GroupLayout> {
        self.groups.iter().find(|g| g.pipeline_id == pipeline_id)
    }

    pub fn node(&self, node_id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|n| n.node_id == node_id)
    }

    pub fn edge(&self, edge_id: &str) -> Option<&EdgeLayout> {
        self.edges.iter().find(|e| e.edge_id == edge_id)
    }
}

/// The layered layout engine.
pub struct Engine<'a> {
    config: &'a LayoutConfig,
}

impl<'a> Engine<'a> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self { config }
    }

    /// Lays out `graph`, treating links on any of `cycles` as back-edges.
    ///
    /// # Errors
    ///
    /// Returns [`PipegraphError::Layout`] when the ranking engine fails or a
    /// pipeline cannot be positioned.
    pub fn layout(
        &self,
        graph: &ComponentGraph,
        pipelines: &PipelineGraph,
        cycles: &CycleSet,
    ) -> Result<Layout, PipegraphError> {
        info!(groups = graph.groups().len(); "Calculating layout");

        let shapes: HashMap<&str, GroupShape> = graph
            .groups()
            .iter()
            .map(|group| {
                let shape = measure_group(
                    group,
                    self.config.node_size(),
                    self.config.node_spacing(),
                    self.config.group_padding(),
                );
                (group.id(), shape)
            })
            .collect();

        let vertex_spacing = (self.config.node_size().width() / 50.0).clamp(2.0, 5.0) as f64;
        let ranking = sugiyama::rank_pipelines(pipelines, cycles, vertex_spacing)?;

        let group_size = |id: &str| -> Result<Size, PipegraphError> {
            shapes
                .get(id)
                .map(GroupShape::size)
                .ok_or_else(|| PipegraphError::Layout(format!("Shape not found for pipeline {id}")))
        };

        // Centers of every group
        let mut centers: HashMap<&str, Point> = HashMap::new();
        let mut cursor_y = 0.0_f32;

        for component in ranking.components() {
            let mut columns = Vec::with_capacity(component.len());
            for rank in component {
                let sizes = rank
                    .iter()
                    .map(|&index| {
                        let id = pipelines.pipeline(index);
                        group_size(id).map(|size| (id, size))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                columns.push(sizes);
            }

            let spacing = self.config.node_spacing();
            let column_height = |column: &[(&str, Size)]| {
                column.iter().map(|(_, s)| s.height()).sum::<f32>()
                    + column.len().saturating_sub(1) as f32 * spacing
            };
            let height = columns
                .iter()
                .map(|c| column_height(c))
                .fold(0.0_f32, f32::max);

            let mut x = 0.0_f32;
            for column in &columns {
                let width = column.iter().map(|(_, s)| s.width()).fold(0.0_f32, f32::max);
                let mut y = cursor_y + (height - column_height(column)) / 2.0;
                for &(id, size) in column {
                    centers.insert(id, Point::new(x + width / 2.0, y + size.height() / 2.0));
                    y += size.height() + spacing;
                }
                x += width + self.config.rank_spacing();
            }
            cursor_y += height + self.config.rank_spacing();
        }

        if !ranking.unranked().is_empty() {
            let row = ranking
                .unranked()
                .iter()
                .map(|&index| {
                    let id = pipelines.pipeline(index);
                    group_size(id).map(|size| (id, size))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let height = row.iter().map(|(_, s)| s.height()).fold(0.0_f32, f32::max);
            let mut x = 0.0_f32;
            for (id, size) in row {
                centers.insert(id, Point::new(x + size.width() / 2.0, cursor_y + height / 2.0));
                x += size.width() + self.config.rank_spacing();
            }
        }

        let mut layout = Layout::default();
        let mut group_bounds: HashMap<&str, Bounds> = HashMap::new();
        let mut node_bounds: HashMap<usize, Bounds> = HashMap::new();

        for group in graph.groups() {
            let id = group.id();
            let center = *centers.get(id).ok_or_else(|| {
                PipegraphError::Layout(format!("Position not found for pipeline {id}"))
            })?;
            let shape = shapes
                .get(id)
                .ok_or_else(|| PipegraphError::Layout(format!("Shape not found for pipeline {id}")))?;
            let bounds = Bounds::new_from_center(center, shape.size());
            group_bounds.insert(id, bounds);
            layout.groups.push(GroupLayout {
                pipeline_id: id.to_string(),
                bounds,
            });

            for &(node, relative_center) in shape.node_centers() {
                let node_bound = Bounds::new_from_center(
                    bounds.min_point().add_point(relative_center),
                    self.config.node_size(),
                );
                node_bounds.insert(node, node_bound);
            }
        }

        for (index, node) in graph.nodes().iter().enumerate() {
            let bounds = *node_bounds.get(&index).ok_or_else(|| {
                PipegraphError::Layout(format!("Position not found for node {}", node.id()))
            })?;
            layout.nodes.push(NodeLayout {
                node_id: node.id().to_string(),
                bounds,
            });
        }

        let router = Router {
            graph,
            cycles,
            group_bounds: &group_bounds,
            node_bounds: &node_bounds,
            lowest: group_bounds.values().map(|b| b.max_y()).fold(0.0_f32, f32::max),
            back_edge_padding: self.config.back_edge_padding(),
        };
        let mut back_edges = 0;
        for edge in graph.edges() {
            let routed = router.route(edge, back_edges)?;
            if routed.kind == EdgeKind::ConnectorCycle {
                back_edges += 1;
            }
            layout.edges.push(routed);
        }

        let extent = layout
            .groups
            .iter()
            .map(|g| g.bounds)
            .reduce(|a, b| a.merge(&b))
            .map(Bounds::to_size)
            .unwrap_or_default();
        let depth = back_edges as f32 * self.config.back_edge_padding();
        layout.size = Size::new(extent.width(), extent.height() + depth);

        debug!(
            groups = layout.groups.len(),
            nodes = layout.nodes.len(),
            edges = layout.edges.len(),
            back_edges;
            "Layout calculated"
        );

        Ok(layout)
    }
}

/// Edge routing over placed groups and nodes.
struct Router<'a> {
    graph: &'a ComponentGraph,
    cycles: &'a CycleSet,
    group_bounds: &'a HashMap<&'a str, Bounds>,
    node_bounds: &'a HashMap<usize, Bounds>,
    /// Bottom edge of the lowest group
    lowest: f32,
    back_edge_padding: f32,
}

impl<'a> Router<'a> {
    /// Pipeline and bounds of a node.
    fn endpoint(&self, id: &str) -> Result<(&'a str, Bounds), PipegraphError> {
        let index = self
            .graph
            .node_index(id)
            .ok_or_else(|| PipegraphError::Layout(format!("Unknown edge endpoint {id}")))?;
        let bounds = self
            .node_bounds
            .get(&index)
            .copied()
            .ok_or_else(|| PipegraphError::Layout(format!("Position not found for node {id}")))?;
        Ok((self.graph.nodes()[index].pipeline_id(), bounds))
    }

    fn group(&self, id: &str) -> Result<Bounds, PipegraphError> {
        self.group_bounds
            .get(id)
            .copied()
            .ok_or_else(|| PipegraphError::Layout(format!("Position not found for pipeline {id}")))
    }

    /// Routes one edge; `back_edges` counts the back-edges routed before it.
    fn route(&self, edge: &GraphEdge, back_edges: usize) -> Result<EdgeLayout, PipegraphError> {
        let (source_pipeline, source) = self.endpoint(edge.source())?;
        let (target_pipeline, target) = self.endpoint(edge.target())?;
        let start = source.right_middle();
        let end = target.left_middle();

        let routed = |kind, route| EdgeLayout {
            edge_id: edge.id().to_string(),
            kind,
            route,
        };

        if !edge.crosses_pipeline() {
            return Ok(routed(
                EdgeKind::Default,
                EdgeRoute::Polyline {
                    points: vec![start, end],
                },
            ));
        }

        let source_group = self.group(source_pipeline)?;
        let target_group = self.group(target_pipeline)?;

        if self.cycles.contains_link(source_pipeline, target_pipeline)
            && source_group.min_x() >= target_group.min_x()
        {
            let path = CyclePath {
                center_x: source_group.center().midpoint(target_group.center()).x(),
                center_y: self.lowest,
                offset: (back_edges + 1) as f32 * self.back_edge_padding,
            };
            return Ok(routed(EdgeKind::ConnectorCycle, EdgeRoute::CyclePath(path)));
        }

        let middle = source_group.max_x() + (target_group.min_x() - source_group.max_x()) / 2.0;
        Ok(routed(
            EdgeKind::Connector,
            EdgeRoute::Polyline {
                points: vec![
                    start,
                    Point::new(middle, start.y()),
                    Point::new(middle, end.y()),
                    end,
                ],
            },
        ))
    }
}
