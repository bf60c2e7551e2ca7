//! Component-level graph built from pipeline definitions.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, trace};
use serde::Serialize;

use pipegraph_core::component::{NodeKind, Role, Section};
use pipegraph_parser::{
    Diagnostic, ErrorCode, PipelineDefinition, References, Span, references::ComponentRef,
};

use super::pipeline_graph::{Link, PipelineGraph};

/// One occurrence of a component inside a pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    id: String,
    kind: NodeKind,
    pipeline_id: String,
    label: String,
    is_connector: bool,
    #[serde(skip)]
    span: Span,
}

impl GraphNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    /// The component name as written in the pipeline.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_connector(&self) -> bool {
        self.is_connector
    }

    /// Source span of the occurrence.
    pub fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    id: String,
    source: String,
    target: String,
    crosses_pipeline: bool,
}

impl GraphEdge {
    fn new(source: &str, target: &str, crosses_pipeline: bool) -> Self {
        Self {
            id: format!("{source}->{target}"),
            source: source.to_string(),
            target: target.to_string(),
            crosses_pipeline,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// True for connector edges from an exporter to a receiver.
    pub fn crosses_pipeline(&self) -> bool {
        self.crosses_pipeline
    }
}

/// The nodes of one pipeline, by role, as indices into
/// [`ComponentGraph::nodes`].
#[derive(Debug, Clone)]
pub struct PipelineGroup {
    id: String,
    id_span: Span,
    span: Span,
    receivers: Vec<usize>,
    processors: Vec<usize>,
    exporters: Vec<usize>,
}

impl PipelineGroup {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Span of the pipeline key.
    pub fn id_span(&self) -> Span {
        self.id_span
    }

    /// Span of the whole definition.
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn nodes(&self, role: Role) -> &[usize] {
        match role {
            Role::Receivers => &self.receivers,
            Role::Processors => &self.processors,
            Role::Exporters => &self.exporters,
            Role::Extensions => &[],
        }
    }

    pub fn node_count(&self) -> usize {
        self.receivers.len() + self.processors.len() + self.exporters.len()
    }
}

/// Typed nodes and directed edges of every pipeline.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComponentGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    #[serde(skip)]
    groups: Vec<PipelineGroup>,
    #[serde(skip)]
    node_indices: HashMap<String, usize>,
}

impl ComponentGraph {
    /// Nodes grouped by pipeline, in definition order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Pipeline groups in definition order.
    pub fn groups(&self) -> &[PipelineGroup] {
        &self.groups
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_indices.get(id).map(|&index| &self.nodes[index])
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.node_indices.get(id).copied()
    }

    pub fn group(&self, pipeline_id: &str) -> Option<&PipelineGroup> {
        self.groups.iter().find(|group| group.id == pipeline_id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.groups.is_empty()
    }

    fn add_node(
        &mut self,
        kind: NodeKind,
        pipeline_id: &str,
        reference: &ComponentRef,
        is_connector: bool,
    ) -> usize {
        let base = format!("{pipeline_id}:{kind}:{}", reference.name);
        let mut id = base.clone();
        let mut occurrence = 1;
        while self.node_indices.contains_key(&id) {
            occurrence += 1;
            id = format!("{base}#{occurrence}");
        }

        let index = self.nodes.len();
        self.node_indices.insert(id.clone(), index);
        self.nodes.push(GraphNode {
            id,
            kind,
            pipeline_id: pipeline_id.to_string(),
            label: reference.name.clone(),
            is_connector,
            span: reference.span,
        });
        index
    }

    fn connect(&mut self, source: usize, target: usize, crosses_pipeline: bool) {
        let edge = GraphEdge::new(
            &self.nodes[source].id,
            &self.nodes[target].id,
            crosses_pipeline,
        );
        trace!(edge = edge.id; "Added edge");
        self.edges.push(edge);
    }
}

/// Builds the component graph and the pipeline graph.
///
/// A pipeline id defined more than once uses its last definition. Anomalies
/// (no receivers, no exporters, a definition that is not a mapping) are
/// returned as warnings; the missing side is simply left out of the graph.
pub fn build_graphs(references: &References) -> (ComponentGraph, PipelineGraph, Vec<Diagnostic>) {
    let connectors: HashSet<&str> = references
        .declared(Section::Connectors)
        .iter()
        .map(|c| c.name.as_str())
        .collect();

    let mut definitions: IndexMap<&str, &PipelineDefinition> = IndexMap::new();
    for definition in references.pipelines() {
        definitions.insert(definition.id(), definition);
    }

    let mut graph = ComponentGraph::default();
    let mut pipelines = PipelineGraph::new();
    let mut anomalies = Vec::new();

    for definition in definitions.values() {
        let group = add_pipeline(&mut graph, definition, &connectors, &mut anomalies);
        pipelines.add_pipeline(group.id());
        graph.groups.push(group);
    }

    connect_pipelines(&mut graph, &mut pipelines);

    debug!(
        pipelines = pipelines.pipeline_count(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        links = pipelines.link_count(),
        anomalies = anomalies.len();
        "Built component graph"
    );

    (graph, pipelines, anomalies)
}

fn add_pipeline(
    graph: &mut ComponentGraph,
    definition: &PipelineDefinition,
    connectors: &HashSet<&str>,
    anomalies: &mut Vec<Diagnostic>,
) -> PipelineGroup {
    let id = definition.id();
    let id_span = definition.id.span();

    let mut group = PipelineGroup {
        id: id.to_string(),
        id_span,
        span: definition.span,
        receivers: Vec::new(),
        processors: Vec::new(),
        exporters: Vec::new(),
    };

    if !definition.well_formed {
        anomalies.push(
            Diagnostic::warning(format!("pipeline `{id}` is not a mapping of component lists"))
                .with_code(ErrorCode::E302)
                .with_label(id_span, "malformed pipeline")
                .with_help("list components under `receivers`, `processors` and `exporters`"),
        );
        return group;
    }

    if definition.receivers.is_empty() {
        anomalies.push(
            Diagnostic::warning(format!("pipeline `{id}` has no receivers"))
                .with_code(ErrorCode::E300)
                .with_label(id_span, "defined here"),
        );
    }
    if definition.exporters.is_empty() {
        anomalies.push(
            Diagnostic::warning(format!("pipeline `{id}` has no exporters"))
                .with_code(ErrorCode::E301)
                .with_label(id_span, "defined here"),
        );
    }

    for role in Role::PIPELINE {
        let Some(kind) = role.node_kind() else {
            continue;
        };
        let indices: Vec<usize> = definition
            .role(role)
            .iter()
            .map(|reference| {
                let is_connector = connectors.contains(reference.name.as_str());
                graph.add_node(kind, id, reference, is_connector)
            })
            .collect();
        match role {
            Role::Receivers => group.receivers = indices,
            Role::Processors => group.processors = indices,
            Role::Exporters => group.exporters = indices,
            Role::Extensions => {}
        }
    }

    match (group.processors.first(), group.processors.last()) {
        (Some(&first), Some(&last)) => {
            for &receiver in &group.receivers {
                graph.connect(receiver, first, false);
            }
            for pair in group.processors.windows(2) {
                graph.connect(pair[0], pair[1], false);
            }
            for &exporter in &group.exporters {
                graph.connect(last, exporter, false);
            }
        }
        _ => {
            for &receiver in &group.receivers {
                for &exporter in &group.exporters {
                    graph.connect(receiver, exporter, false);
                }
            }
        }
    }

    group
}

/// Adds an edge from every connector exporter to every receiver of the same
/// connector, in any pipeline including its own.
fn connect_pipelines(graph: &mut ComponentGraph, pipelines: &mut PipelineGraph) {
    let mut links = Vec::new();
    for source_group in &graph.groups {
        for &exporter in &source_group.exporters {
            let exporter_node = &graph.nodes[exporter];
            if !exporter_node.is_connector {
                continue;
            }
            for target_group in &graph.groups {
                for &receiver in &target_group.receivers {
                    let receiver_node = &graph.nodes[receiver];
                    if receiver_node.is_connector && receiver_node.label == exporter_node.label {
                        links.push((
                            exporter,
                            receiver,
                            source_group.id.clone(),
                            target_group.id.clone(),
                        ));
                    }
                }
            }
        }
    }

    for (exporter, receiver, source, target) in links {
        let connector = graph.nodes[exporter].label.clone();
        graph.connect(exporter, receiver, true);
        pipelines.add_link(&source, &target, Link::new(connector));
    }
}
