//! Graph structures derived from a configuration's pipeline definitions.
//!
//! - [`ComponentGraph`]: one node per component occurrence, edges along each
//!   pipeline plus connector edges between pipelines.
//! - [`PipelineGraph`]: the reduced graph with one vertex per pipeline and one
//!   edge per connector link, used for cycle analysis and pipeline ranking.
//!
//! Both are produced together by [`build_graphs`].

mod component_graph;
mod pipeline_graph;

pub use component_graph::{ComponentGraph, GraphEdge, GraphNode, PipelineGroup, build_graphs};
pub use pipeline_graph::{Link, PipelineGraph};
