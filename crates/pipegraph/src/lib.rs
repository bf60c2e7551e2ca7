//! Pipegraph - validated, cycle-aware graphs of collector pipeline
//! configurations.
//!
//! A configuration document is parsed with offsets preserved, its component
//! references are cross-checked, its pipelines become a graph of typed nodes,
//! cycles through connectors are enumerated and everything is laid out in
//! layers. Every stage is a pure function of the source text; an
//! [`Analysis`] holds the results of one pass.

pub mod config;
pub mod cycles;
pub mod layout;
pub mod navigation;
pub mod remote;
pub mod state;
pub mod structure;

mod error;

pub use pipegraph_parser::{
    Diagnostic, Document, ErrorCode, ParseError, References, ReferenceFinding, Severity, Span,
};

pub use error::PipegraphError;

use log::{debug, info, trace};
use serde::{Serialize, ser::SerializeStruct};

use pipegraph_parser::{
    ValidationOptions, extract_references, locate::LineIndex, parse_document, validate_references,
};

use config::AppConfig;
use cycles::CycleSet;
use layout::Layout;
use navigation::CursorTarget;
use remote::RemoteVerdict;
use structure::{ComponentGraph, PipelineGraph};

/// A diagnostic resolved to a source position, ready for inline display.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    line: usize,
    column: usize,
    span: Span,
}

impl Marker {
    fn from_diagnostic(diagnostic: &Diagnostic, lines: &LineIndex<'_>) -> Self {
        let span = diagnostic.primary_span().unwrap_or_default();
        let (line, column) = lines.position(span.start());
        Self {
            severity: diagnostic.severity(),
            code: diagnostic.code(),
            message: diagnostic.message().to_string(),
            line,
            column,
            span,
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 1-based line.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column, in characters.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn offset(&self) -> usize {
        self.span.start()
    }
}

impl Serialize for Marker {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut marker = serializer.serialize_struct("Marker", 7)?;
        marker.serialize_field("severity", &self.severity.to_string())?;
        marker.serialize_field("code", &self.code.map(|c| c.as_str()))?;
        marker.serialize_field("message", &self.message)?;
        marker.serialize_field("line", &self.line)?;
        marker.serialize_field("column", &self.column)?;
        marker.serialize_field("start", &self.span.start())?;
        marker.serialize_field("end", &self.span.end())?;
        marker.end()
    }
}

/// Results of analyzing one configuration text.
///
/// When the text cannot be parsed, the analysis holds a single document-level
/// error and no document, graph or layout.
#[derive(Debug, Clone)]
pub struct Analysis {
    source: String,
    document: Option<Document>,
    references: References,
    findings: Vec<ReferenceFinding>,
    diagnostics: Vec<Diagnostic>,
    markers: Vec<Marker>,
    graph: Option<ComponentGraph>,
    pipelines: PipelineGraph,
    cycles: CycleSet,
    layout: Option<Layout>,
}

impl Analysis {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            document: None,
            references: References::default(),
            findings: Vec::new(),
            diagnostics: Vec::new(),
            markers: Vec::new(),
            graph: None,
            pipelines: PipelineGraph::default(),
            cycles: CycleSet::default(),
            layout: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed document, absent after a structural parse error.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn references(&self) -> &References {
        &self.references
    }

    /// Undefined and unused component findings, sorted by offset.
    pub fn findings(&self) -> &[ReferenceFinding] {
        &self.findings
    }

    /// Every diagnostic of the pass, sorted by offset.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics with line and column, sorted by offset.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn graph(&self) -> Option<&ComponentGraph> {
        self.graph.as_ref()
    }

    pub fn pipeline_graph(&self) -> &PipelineGraph {
        &self.pipelines
    }

    pub fn cycles(&self) -> &CycleSet {
        &self.cycles
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    /// True when any marker has error severity.
    pub fn has_errors(&self) -> bool {
        self.markers.iter().any(|m| m.severity.is_error())
    }

    /// Fails with every error-severity diagnostic of the pass.
    ///
    /// # Errors
    ///
    /// Returns [`PipegraphError::Parse`] carrying the error diagnostics and
    /// the source text when [`Analysis::has_errors`] is true.
    pub fn ensure_valid(&self) -> Result<(), PipegraphError> {
        let errors: Vec<Diagnostic> = self
            .diagnostics
            .iter()
            .filter(|d| d.severity().is_error())
            .cloned()
            .collect();
        if errors.is_empty() {
            return Ok(());
        }
        Err(PipegraphError::new_parse_error(
            ParseError::new(errors),
            self.source.as_str(),
        ))
    }

    /// 1-based source position of a graph node.
    pub fn node_position(&self, node_id: &str) -> Option<(usize, usize)> {
        let graph = self.graph.as_ref()?;
        navigation::node_position(graph, &LineIndex::new(&self.source), node_id)
    }

    /// Pipeline and node enclosing a byte offset.
    pub fn element_at(&self, offset: usize) -> Option<CursorTarget> {
        navigation::element_at(self.graph.as_ref()?, offset)
    }

    /// Pipeline and node enclosing a 1-based `(line, column)` cursor.
    pub fn element_at_position(&self, line: usize, column: usize) -> Option<CursorTarget> {
        let graph = self.graph.as_ref()?;
        navigation::element_at_position(graph, &LineIndex::new(&self.source), line, column)
    }

    /// Span of the element a path of keys and indices leads to.
    pub fn resolve_path<S: AsRef<str>>(&self, segments: &[S]) -> Option<Span> {
        navigation::resolve_path(self.document.as_ref()?, segments)
    }

    fn set_diagnostics(&mut self, mut diagnostics: Vec<Diagnostic>) {
        diagnostics.sort_by_key(|d| d.primary_span().unwrap_or_default().start());
        let lines = LineIndex::new(&self.source);
        self.markers = diagnostics
            .iter()
            .map(|d| Marker::from_diagnostic(d, &lines))
            .collect();
        self.diagnostics = diagnostics;
    }
}

/// Entry point running every analysis stage over a configuration text.
///
/// # Examples
///
/// ```
/// use pipegraph::{Analyzer, config::AppConfig};
///
/// let source = "
/// receivers:
///   otlp:
/// exporters:
///   debug:
/// service:
///   pipelines:
///     traces:
///       receivers: [otlp]
///       exporters: [debug]
/// ";
///
/// let analyzer = Analyzer::new(AppConfig::default());
/// let analysis = analyzer.analyze(source).expect("layout should succeed");
/// assert!(analysis.markers().is_empty());
/// assert_eq!(analysis.graph().map(|g| g.nodes().len()), Some(2));
/// ```
#[derive(Debug, Default)]
pub struct Analyzer {
    config: AppConfig,
}

impl Analyzer {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs parse, reference validation, graph construction, cycle search
    /// and layout in one pass.
    ///
    /// A structural parse error does not fail the call: it becomes the only
    /// marker of the returned analysis.
    ///
    /// # Errors
    ///
    /// Returns [`PipegraphError::Layout`] when the layout engine fails.
    pub fn analyze(&self, source: &str) -> Result<Analysis, PipegraphError> {
        info!(bytes = source.len(); "Analyzing configuration");
        let mut analysis = Analysis::new(source);

        let document = match parse_document(source) {
            Ok(document) => document,
            Err(err) => {
                debug!(diagnostics = err.diagnostics().len(); "Configuration failed to parse");
                let primary = err
                    .primary()
                    .cloned()
                    .unwrap_or_else(|| Diagnostic::error(err.to_string()));
                analysis.set_diagnostics(vec![primary]);
                return Ok(analysis);
            }
        };

        let references = extract_references(&document);
        let options = ValidationOptions {
            distribution_validation: self.config.validation().distribution_validation(),
        };
        let findings = validate_references(&references, options);

        let (graph, pipelines, anomalies) = structure::build_graphs(&references);

        let max_cycles = self.config.validation().max_cycles();
        let cycles = cycles::find_cycles(&pipelines, max_cycles);

        let layout = layout::Engine::new(self.config.layout()).layout(&graph, &pipelines, &cycles)?;

        let mut diagnostics: Vec<Diagnostic> =
            findings.iter().map(ReferenceFinding::to_diagnostic).collect();
        diagnostics.extend(anomalies);
        diagnostics.extend(cycles.truncation_diagnostic(max_cycles));

        analysis.document = Some(document);
        analysis.references = references;
        analysis.findings = findings;
        analysis.graph = Some(graph);
        analysis.pipelines = pipelines;
        analysis.cycles = cycles;
        analysis.layout = Some(layout);
        analysis.set_diagnostics(diagnostics);

        info!(
            markers = analysis.markers.len(),
            cycles = analysis.cycles.len();
            "Configuration analyzed"
        );
        trace!(markers:? = analysis.markers; "Analysis markers");

        Ok(analysis)
    }

    /// Adds the verdict of an external distribution validator to `analysis`.
    ///
    /// Accepting verdicts leave the analysis unchanged.
    pub fn apply_remote_verdict(&self, analysis: &mut Analysis, verdict: &RemoteVerdict) {
        let Some(diagnostic) = verdict.to_diagnostic(analysis.document()) else {
            debug!("Validator accepted the configuration");
            return;
        };
        let mut diagnostics = std::mem::take(&mut analysis.diagnostics);
        diagnostics.push(diagnostic);
        analysis.set_diagnostics(diagnostics);
    }
}
