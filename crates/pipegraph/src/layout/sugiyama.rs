//! Pipeline ranking with the rust-sugiyama engine.
//!
//! Only acyclic links between distinct pipelines are ranked. The engine lays
//! out each weakly connected component separately; its coordinates are reduced
//! here to ordered ranks, so the caller decides the final geometry.

use std::collections::{HashMap, HashSet};

use log::debug;
use petgraph::{graph::NodeIndex, visit::EdgeRef};
use rust_sugiyama::configure::Config;

use crate::{cycles::CycleSet, error::PipegraphError, structure::PipelineGraph};

const EPSILON: f64 = 1e-6;

/// Ranked pipelines.
#[derive(Debug, Clone, Default)]
pub(super) struct Ranking {
    /// Per weakly connected component, the ranks from first to last, each
    /// holding its pipelines in order
    components: Vec<Vec<Vec<NodeIndex>>>,
    /// Pipelines without any ranked link, in definition order
    unranked: Vec<NodeIndex>,
}

impl Ranking {
    pub(super) fn components(&self) -> &[Vec<Vec<NodeIndex>>] {
        &self.components
    }

    pub(super) fn unranked(&self) -> &[NodeIndex] {
        &self.unranked
    }
}

/// Links that take part in the ranking: no self-loops, none on a cycle, no
/// parallel duplicates.
fn ranked_links(pipelines: &PipelineGraph, cycles: &CycleSet) -> Vec<(u32, u32)> {
    let graph = pipelines.inner();
    let mut seen = HashSet::new();
    graph
        .edge_references()
        .filter(|edge| edge.source() != edge.target())
        .filter(|edge| {
            !cycles.contains_link(
                pipelines.pipeline(edge.source()),
                pipelines.pipeline(edge.target()),
            )
        })
        .map(|edge| (edge.source().index() as u32, edge.target().index() as u32))
        .filter(|link| seen.insert(*link))
        .collect()
}

pub(super) fn rank_pipelines(
    pipelines: &PipelineGraph,
    cycles: &CycleSet,
    vertex_spacing: f64,
) -> Result<Ranking, PipegraphError> {
    let edges = ranked_links(pipelines, cycles);
    if edges.is_empty() {
        debug!(pipelines = pipelines.pipeline_count(); "No ranked links, placing pipelines in a row");
        return Ok(Ranking {
            components: Vec::new(),
            unranked: pipelines.inner().node_indices().collect(),
        });
    }

    debug!(
        pipelines = pipelines.pipeline_count(),
        links = edges.len();
        "Applying Sugiyama algorithm to pipeline graph"
    );

    let engine_edges = edges.clone();
    let layouts = std::panic::catch_unwind(move || {
        let config = Config {
            minimum_length: 1,
            vertex_spacing,
            ..Default::default()
        };
        rust_sugiyama::from_edges(&engine_edges, &config)
    })
    .map_err(|err| {
        let message = if let Some(panic_msg) = err.downcast_ref::<String>() {
            format!("Rust-sugiyama layout engine panicked: {panic_msg}")
        } else if let Some(panic_msg) = err.downcast_ref::<&str>() {
            format!("Rust-sugiyama layout engine panicked: {panic_msg}")
        } else {
            "Rust-sugiyama layout engine panicked with unknown error".to_string()
        };
        PipegraphError::Layout(message)
    })?;

    if layouts.is_empty() {
        return Err(PipegraphError::Layout(
            "Rust-sugiyama returned empty layout results".to_string(),
        ));
    }

    let mut ranked = HashSet::new();
    let mut components: Vec<Vec<Vec<NodeIndex>>> = Vec::new();
    for (coords, _, _) in &layouts {
        let positions: HashMap<u32, (f64, f64)> = coords
            .iter()
            .filter_map(|&(id, position)| {
                let id = u32::try_from(id).ok()?;
                ((id as usize) < pipelines.pipeline_count()).then_some((id, position))
            })
            .collect();
        if positions.is_empty() {
            continue;
        }
        ranked.extend(positions.keys().copied());
        let ranks: Vec<Vec<NodeIndex>> = component_ranks(&positions, &edges)
            .into_iter()
            .map(|rank| rank.into_iter().map(|id| NodeIndex::new(id as usize)).collect())
            .collect();
        components.push(ranks);
    }

    if ranked.is_empty() {
        return Err(PipegraphError::Layout(
            "Failed to map any rust-sugiyama positions back to pipelines".to_string(),
        ));
    }

    let unranked = pipelines
        .inner()
        .node_indices()
        .filter(|index| !ranked.contains(&(index.index() as u32)))
        .collect();

    Ok(Ranking {
        components,
        unranked,
    })
}

fn x_of(position: &(f64, f64)) -> f64 {
    position.0
}

fn y_of(position: &(f64, f64)) -> f64 {
    position.1
}

/// Groups the vertices of one engine component into ranks.
///
/// The rank axis is the one along which every link changes coordinate; the
/// engine's vertical layering is preferred when both qualify. Ranks are
/// ordered so that links point from earlier to later ranks, and vertices
/// within a rank keep the engine's crossing-minimised order.
fn component_ranks(positions: &HashMap<u32, (f64, f64)>, edges: &[(u32, u32)]) -> Vec<Vec<u32>> {
    let deltas = |axis: fn(&(f64, f64)) -> f64| -> Vec<f64> {
        edges
            .iter()
            .filter_map(|(source, target)| {
                Some(axis(positions.get(target)?) - axis(positions.get(source)?))
            })
            .collect()
    };
    let separates = |deltas: &[f64]| deltas.iter().all(|d| d.abs() > EPSILON);

    let (y_deltas, x_deltas) = (deltas(y_of), deltas(x_of));
    let vertical = separates(&y_deltas) || !separates(&x_deltas);
    let rank_axis: fn(&(f64, f64)) -> f64 = if vertical { y_of } else { x_of };
    let order_axis: fn(&(f64, f64)) -> f64 = if vertical { x_of } else { y_of };
    let rank_deltas = if vertical { y_deltas } else { x_deltas };
    let direction = if rank_deltas.iter().sum::<f64>() < 0.0 {
        -1.0
    } else {
        1.0
    };

    let mut vertices: Vec<(f64, f64, u32)> = positions
        .iter()
        .map(|(&id, position)| (direction * rank_axis(position), order_axis(position), id))
        .collect();
    vertices.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then(a.1.total_cmp(&b.1))
            .then(a.2.cmp(&b.2))
    });

    let mut ranks: Vec<Vec<u32>> = Vec::new();
    let mut current_rank = f64::NEG_INFINITY;
    for (rank, _, id) in vertices {
        match ranks.last_mut() {
            Some(last) if (rank - current_rank).abs() <= EPSILON => last.push(id),
            _ => {
                ranks.push(vec![id]);
                current_rank = rank;
            }
        }
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_engine_layers() {
        let positions = HashMap::from([(0, (0.0, 0.0)), (1, (-5.0, -10.0)), (2, (5.0, -10.0))]);
        let ranks = component_ranks(&positions, &[(0, 1), (0, 2)]);
        assert_eq!(ranks, vec![vec![0], vec![1, 2]]);
    }

    #[test]
    fn test_horizontal_engine_layers() {
        let positions = HashMap::from([(0, (0.0, 3.0)), (1, (10.0, 3.0)), (2, (20.0, 3.0))]);
        let ranks = component_ranks(&positions, &[(0, 1), (1, 2)]);
        assert_eq!(ranks, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_links_always_point_forward() {
        let positions = HashMap::from([(0, (0.0, 20.0)), (1, (0.0, 10.0)), (2, (0.0, 0.0))]);
        let ranks = component_ranks(&positions, &[(0, 1), (1, 2)]);
        assert_eq!(ranks, vec![vec![0], vec![1], vec![2]]);
    }
}
