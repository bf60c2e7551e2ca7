//! Pipeline-level connector graph.

use std::collections::HashMap;

use petgraph::{
    Direction,
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
};

/// A connector link between two pipelines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    connector: String,
}

impl Link {
    pub fn new(connector: impl Into<String>) -> Self {
        Self {
            connector: connector.into(),
        }
    }

    /// Name of the connector exported by the source pipeline and received by
    /// the target pipeline.
    pub fn connector(&self) -> &str {
        &self.connector
    }
}

/// Directed multigraph of pipelines.
///
/// Vertices are pipeline ids in definition order; parallel links and
/// self-loops are kept.
#[derive(Debug, Clone, Default)]
pub struct PipelineGraph {
    graph: DiGraph<String, Link>,
    indices: HashMap<String, NodeIndex>,
}

impl PipelineGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pipeline vertex, returning the existing one for a known id.
    pub fn add_pipeline(&mut self, id: &str) -> NodeIndex {
        if let Some(&index) = self.indices.get(id) {
            return index;
        }
        let index = self.graph.add_node(id.to_string());
        self.indices.insert(id.to_string(), index);
        index
    }

    /// Adds a link between two known pipelines.
    ///
    /// Returns `None` when either pipeline has not been added.
    pub fn add_link(&mut self, source: &str, target: &str, link: Link) -> Option<EdgeIndex> {
        let source = *self.indices.get(source)?;
        let target = *self.indices.get(target)?;
        Some(self.graph.add_edge(source, target, link))
    }

    /// The underlying petgraph graph.
    pub fn inner(&self) -> &DiGraph<String, Link> {
        &self.graph
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.indices.get(id).copied()
    }

    /// Pipeline id of a vertex.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not belong to this graph.
    pub fn pipeline(&self, index: NodeIndex) -> &str {
        &self.graph[index]
    }

    /// Pipeline ids in definition order.
    pub fn pipelines(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// All links as `(source, target, link)` in insertion order.
    pub fn links(&self) -> impl Iterator<Item = (&str, &str, &Link)> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].as_str(),
                self.graph[edge.target()].as_str(),
                edge.weight(),
            )
        })
    }

    /// Distinct successors of a vertex in ascending index order.
    pub fn successors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut successors: Vec<_> = self
            .graph
            .neighbors_directed(index, Direction::Outgoing)
            .collect();
        successors.sort_unstable();
        successors.dedup();
        successors
    }

    pub fn has_self_loop(&self, index: NodeIndex) -> bool {
        self.graph.contains_edge(index, index)
    }

    pub fn pipeline_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }
}
