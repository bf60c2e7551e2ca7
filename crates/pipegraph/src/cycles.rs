//! Simple-cycle enumeration over the pipeline graph.
//!
//! Strongly connected components are found with Tarjan's algorithm; each
//! component that can hold a cycle is then searched with Johnson's circuit
//! enumeration. Start vertices are taken in index order and every start is
//! removed from the search once its circuits have been listed, so each simple
//! cycle is reported exactly once, beginning at its lowest-index vertex.
//!
//! The number of simple cycles can grow exponentially with graph density, so
//! enumeration stops after a configurable number of cycles.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use petgraph::{algo::tarjan_scc, graph::NodeIndex};
use serde::Serialize;

use pipegraph_parser::{Diagnostic, ErrorCode, Span};

use crate::structure::PipelineGraph;

/// A simple cycle as an ordered list of pipeline ids.
///
/// The closing link runs from the last pipeline back to the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cycle(Vec<String>);

impl Cycle {
    pub fn new(pipelines: Vec<String>) -> Self {
        Self(pipelines)
    }

    pub fn pipelines(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when both cycles list the same pipelines in the same circular
    /// order, whatever the starting pipeline.
    pub fn is_rotation_of(&self, other: &Cycle) -> bool {
        if self.len() != other.len() {
            return false;
        }
        if self.is_empty() {
            return true;
        }
        (0..self.len()).any(|shift| {
            self.0
                .iter()
                .cycle()
                .skip(shift)
                .zip(&other.0)
                .all(|(a, b)| a == b)
        })
    }

    /// Consecutive `(source, target)` pairs, closing pair included.
    pub fn links(&self) -> impl Iterator<Item = (&str, &str)> {
        let n = self.0.len();
        (0..n).map(move |i| (self.0[i].as_str(), self.0[(i + 1) % n].as_str()))
    }

    /// Whether `source → target` is one of this cycle's links.
    pub fn contains_link(&self, source: &str, target: &str) -> bool {
        self.links().any(|(s, t)| s == source && t == target)
    }
}

/// Result of a cycle search.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleSet {
    cycles: Vec<Cycle>,
    truncated: bool,
}

impl CycleSet {
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// True when enumeration stopped at the configured limit.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    /// Whether the link `source → target` lies on any found cycle.
    pub fn contains_link(&self, source: &str, target: &str) -> bool {
        self.cycles.iter().any(|c| c.contains_link(source, target))
    }

    /// Warning reported when the search was cut short.
    pub fn truncation_diagnostic(&self, limit: usize) -> Option<Diagnostic> {
        self.truncated.then(|| {
            Diagnostic::warning(format!(
                "cycle search stopped after {limit} cycles; further cycles are not reported"
            ))
            .with_code(ErrorCode::E400)
            .with_label(Span::empty(0), "connector links between pipelines")
            .with_help("raise `validation.max_cycles` to search further")
        })
    }
}

/// Enumerates the simple cycles of `graph`, stopping after `max_cycles`.
///
/// Self-loops are cycles of length one. Parallel links between the same
/// pipelines yield a single cycle.
pub fn find_cycles(graph: &PipelineGraph, max_cycles: usize) -> CycleSet {
    let mut search = Johnson::new(graph, max_cycles);

    for mut component in tarjan_scc(graph.inner()) {
        if search.truncated {
            break;
        }
        if component.len() == 1 && !graph.has_self_loop(component[0]) {
            continue;
        }
        component.sort_unstable();
        search.enumerate_component(&component);
    }

    let cycles: Vec<Cycle> = search
        .found
        .iter()
        .map(|path| Cycle::new(path.iter().map(|&i| graph.pipeline(i).to_string()).collect()))
        .collect();

    if search.truncated {
        warn!(limit = max_cycles; "Cycle enumeration truncated");
    }
    debug!(cycles = cycles.len(), truncated = search.truncated; "Enumerated pipeline cycles");

    CycleSet {
        cycles,
        truncated: search.truncated,
    }
}

/// State of Johnson's circuit search.
struct Johnson<'g> {
    graph: &'g PipelineGraph,
    limit: usize,
    /// Vertices still eligible in the current subgraph
    allowed: HashSet<NodeIndex>,
    blocked: HashSet<NodeIndex>,
    blocked_map: HashMap<NodeIndex, Vec<NodeIndex>>,
    stack: Vec<NodeIndex>,
    found: Vec<Vec<NodeIndex>>,
    truncated: bool,
}

impl<'g> Johnson<'g> {
    fn new(graph: &'g PipelineGraph, limit: usize) -> Self {
        Self {
            graph,
            limit,
            allowed: HashSet::new(),
            blocked: HashSet::new(),
            blocked_map: HashMap::new(),
            stack: Vec::new(),
            found: Vec::new(),
            truncated: false,
        }
    }

    /// Lists the circuits of one strongly connected component, whose
    /// vertices are sorted by index.
    fn enumerate_component(&mut self, component: &[NodeIndex]) {
        for (position, &start) in component.iter().enumerate() {
            if self.truncated {
                return;
            }
            self.allowed = component[position..].iter().copied().collect();
            self.blocked.clear();
            self.blocked_map.clear();
            self.circuit(start, start);
        }
    }

    fn successors(&self, vertex: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .successors(vertex)
            .into_iter()
            .filter(|w| self.allowed.contains(w))
            .collect()
    }

    fn circuit(&mut self, vertex: NodeIndex, start: NodeIndex) -> bool {
        let mut closed = false;
        self.stack.push(vertex);
        self.blocked.insert(vertex);

        let successors = self.successors(vertex);
        for &next in &successors {
            if self.truncated {
                break;
            }
            if next == start {
                if self.found.len() >= self.limit {
                    self.truncated = true;
                    break;
                }
                self.found.push(self.stack.clone());
                closed = true;
            } else if !self.blocked.contains(&next) && self.circuit(next, start) {
                closed = true;
            }
        }

        if closed {
            self.unblock(vertex);
        } else {
            for next in successors {
                let waiting = self.blocked_map.entry(next).or_default();
                if !waiting.contains(&vertex) {
                    waiting.push(vertex);
                }
            }
        }

        self.stack.pop();
        closed
    }

    fn unblock(&mut self, vertex: NodeIndex) {
        self.blocked.remove(&vertex);
        if let Some(waiting) = self.blocked_map.remove(&vertex) {
            for other in waiting {
                if self.blocked.contains(&other) {
                    self.unblock(other);
                }
            }
        }
    }
}
