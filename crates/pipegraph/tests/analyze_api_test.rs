use pipegraph::{
    Analyzer, ErrorCode, Severity,
    config::{AppConfig, ValidationConfig},
    cycles::Cycle,
    layout::{EdgeKind, EdgeRoute},
    remote::RemoteVerdict,
};

fn analyze(source: &str) -> pipegraph::Analysis {
    Analyzer::default()
        .analyze(source)
        .expect("analysis should succeed")
}

const SIMPLE: &str = "\
receivers:
  otlp:
exporters:
  debug:
service:
  pipelines:
    traces:
      receivers: [otlp]
      exporters: [debug]
";

const ROUND_TRIP: &str = "\
receivers:
  otlp:
exporters:
  debug:
connectors:
  forward/ab:
  forward/ba:
service:
  pipelines:
    traces/a:
      receivers: [otlp, forward/ba]
      exporters: [forward/ab]
    traces/b:
      receivers: [forward/ab]
      exporters: [forward/ba, debug]
";

#[test]
fn test_simple_pipeline() {
    let analysis = analyze(SIMPLE);
    assert!(analysis.markers().is_empty());
    assert!(!analysis.has_errors());

    let graph = analysis.graph().expect("graph should be built");
    let ids: Vec<_> = graph.nodes().iter().map(|n| n.id()).collect();
    assert_eq!(ids, vec!["traces:receiver:otlp", "traces:exporter:debug"]);
    assert_eq!(graph.edges().len(), 1);
    assert_eq!(graph.edges()[0].id(), "traces:receiver:otlp->traces:exporter:debug");

    assert_eq!(analysis.pipeline_graph().link_count(), 0);
    assert!(analysis.cycles().is_empty());

    let layout = analysis.layout().expect("layout should be computed");
    assert_eq!(layout.groups().len(), 1);
    assert_eq!(layout.nodes().len(), 2);
    assert_eq!(layout.edges()[0].kind(), EdgeKind::Default);

    let receiver = layout.node("traces:receiver:otlp").unwrap().bounds();
    let exporter = layout.node("traces:exporter:debug").unwrap().bounds();
    assert!(receiver.max_x() <= exporter.min_x());
}

#[test]
fn test_pipelines_without_connectors_have_no_links() {
    let source = "\
receivers:
  otlp:
exporters:
  debug:
service:
  pipelines:
    traces:
      receivers: [otlp]
      exporters: [debug]
    metrics:
      receivers: [otlp]
      exporters: [debug]
";
    let analysis = analyze(source);
    assert_eq!(analysis.pipeline_graph().pipeline_count(), 2);
    assert_eq!(analysis.pipeline_graph().link_count(), 0);
    assert!(analysis.cycles().is_empty());
    assert!(
        analysis
            .graph()
            .unwrap()
            .edges()
            .iter()
            .all(|e| !e.crosses_pipeline())
    );
}

#[test]
fn test_self_loop_is_a_cycle() {
    let source = "\
receivers:
  otlp:
connectors:
  loop:
service:
  pipelines:
    traces:
      receivers: [otlp, loop]
      exporters: [loop]
";
    let analysis = analyze(source);
    let cycles = analysis.cycles().cycles();
    assert_eq!(cycles, &[Cycle::new(vec!["traces".to_string()])]);

    let layout = analysis.layout().unwrap();
    let back = layout
        .edge("traces:exporter:loop->traces:receiver:loop")
        .expect("connector edge should be routed");
    assert_eq!(back.kind(), EdgeKind::ConnectorCycle);
}

#[test]
fn test_two_pipeline_cycle_routes_one_back_edge() {
    let analysis = analyze(ROUND_TRIP);
    assert!(analysis.markers().is_empty(), "{:?}", analysis.markers());

    let cycles = analysis.cycles();
    assert_eq!(cycles.len(), 1);
    let expected = Cycle::new(vec!["traces/a".to_string(), "traces/b".to_string()]);
    assert!(cycles.cycles()[0].is_rotation_of(&expected));

    let layout = analysis.layout().unwrap();
    let forward = layout
        .edge("traces/a:exporter:forward/ab->traces/b:receiver:forward/ab")
        .unwrap();
    let back = layout
        .edge("traces/b:exporter:forward/ba->traces/a:receiver:forward/ba")
        .unwrap();
    assert_eq!(forward.kind(), EdgeKind::Connector);
    assert_eq!(back.kind(), EdgeKind::ConnectorCycle);

    let EdgeRoute::CyclePath(path) = back.route() else {
        panic!("back-edge should use a cycle path");
    };
    let lowest = layout
        .groups()
        .iter()
        .map(|g| g.bounds().max_y())
        .fold(0.0_f32, f32::max);
    assert_eq!(path.center_y, lowest);
    assert!(path.offset > 0.0);
    assert!(layout.size().height() > lowest);
}

#[test]
fn test_undefined_reference_reported_once() {
    let source = "\
receivers:
  otlp:
exporters:
  debug:
service:
  pipelines:
    traces:
      receivers: [otlp, item6E]
      exporters: [debug]
";
    let analysis = analyze(source);
    let markers = analysis.markers();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].severity(), Severity::Error);
    assert_eq!(markers[0].code(), Some(ErrorCode::E200));
    assert_eq!((markers[0].line(), markers[0].column()), (8, 25));
    assert!(analysis.has_errors());
    assert!(analysis.ensure_valid().is_err());
}

#[test]
fn test_unused_component_and_distribution_validation() {
    let source = "\
receivers:
  item5:
  otlp:
exporters:
  debug:
service:
  pipelines:
    logs:
      receivers: [otlp]
      exporters: [debug]
";
    let analysis = analyze(source);
    assert_eq!(analysis.markers().len(), 1);
    let marker = &analysis.markers()[0];
    assert_eq!(marker.severity(), Severity::Warning);
    assert_eq!(marker.code(), Some(ErrorCode::E201));
    assert_eq!((marker.line(), marker.column()), (2, 3));
    assert!(analysis.ensure_valid().is_ok());

    let config = AppConfig::new(Default::default(), ValidationConfig::new(true, 10_000));
    let analysis = Analyzer::new(config).analyze(source).unwrap();
    assert!(analysis.markers().is_empty());
}

#[test]
fn test_markers_are_sorted_by_offset() {
    let source = "\
receivers:
  idle:
service:
  extensions: [missing]
  pipelines:
    empty:
      processors: []
";
    let analysis = analyze(source);
    let offsets: Vec<_> = analysis.markers().iter().map(|m| m.offset()).collect();
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));

    let codes: Vec<_> = analysis.markers().iter().filter_map(|m| m.code()).collect();
    assert!(codes.contains(&ErrorCode::E201));
    assert!(codes.contains(&ErrorCode::E200));
    assert!(codes.contains(&ErrorCode::E300));
    assert!(codes.contains(&ErrorCode::E301));
}

#[test]
fn test_empty_document() {
    let analysis = analyze("");
    assert!(analysis.markers().is_empty());
    assert!(analysis.document().is_some_and(|d| d.is_empty()));
    assert!(analysis.graph().is_some_and(|g| g.is_empty()));
    let layout = analysis.layout().unwrap();
    assert!(layout.groups().is_empty());
    assert_eq!(layout.size().width(), 0.0);
}

#[test]
fn test_parse_error_yields_single_marker() {
    let source = "receivers:\n  otlp:\n bad: 1\n";
    let analysis = analyze(source);

    assert_eq!(analysis.markers().len(), 1);
    let marker = &analysis.markers()[0];
    assert_eq!(marker.severity(), Severity::Error);
    assert_eq!(marker.code(), Some(ErrorCode::E100));
    assert_eq!((marker.line(), marker.column()), (3, 2));

    assert!(analysis.document().is_none());
    assert!(analysis.graph().is_none());
    assert!(analysis.layout().is_none());
    assert!(analysis.cycles().is_empty());
}

#[test]
fn test_aliased_component_lists() {
    let source = "\
receivers:
  otlp:
exporters:
  debug:
service:
  pipelines:
    traces:
      receivers: &inputs [otlp]
      exporters: &outputs [debug]
    logs:
      receivers: *inputs
      exporters: *outputs
";
    let analysis = analyze(source);
    assert!(analysis.markers().is_empty(), "{:?}", analysis.markers());

    let graph = analysis.graph().expect("graph should be built");
    assert_eq!(graph.nodes().len(), 4);
    assert_eq!(analysis.layout().unwrap().groups().len(), 2);

    let analysis = analyze("receivers:\n  otlp: *missing\n");
    assert_eq!(analysis.markers().len(), 1);
    assert_eq!(analysis.markers()[0].code(), Some(ErrorCode::E106));
    assert_eq!(
        (analysis.markers()[0].line(), analysis.markers()[0].column()),
        (2, 9)
    );
}

#[test]
fn test_navigation_through_analysis() {
    let analysis = analyze(SIMPLE);
    assert_eq!(analysis.node_position("traces:exporter:debug"), Some((9, 19)));
    assert_eq!(analysis.node_position("traces:exporter:missing"), None);

    let target = analysis
        .element_at_position(8, 20)
        .expect("cursor is inside the traces pipeline");
    assert_eq!(target.pipeline, "traces");
    assert_eq!(target.node.as_deref(), Some("traces:receiver:otlp"));

    assert_eq!(analysis.element_at(0), None);

    let span = analysis
        .resolve_path(&["service", "pipelines", "traces", "exporters", "0"])
        .unwrap();
    assert_eq!(&SIMPLE[span.start()..span.end()], "debug");
}

#[test]
fn test_remote_verdict_adds_marker() {
    let analyzer = Analyzer::default();
    let mut analysis = analyzer.analyze(SIMPLE).unwrap();

    let accepted = RemoteVerdict::from_json(r#"{"message": "valid"}"#).unwrap();
    analyzer.apply_remote_verdict(&mut analysis, &accepted);
    assert!(analysis.markers().is_empty());

    let rejected = RemoteVerdict::from_json(
        r#"{
            "message": "invalid configuration",
            "error": "unknown receiver type",
            "path": ["service", "pipelines", "traces", "receivers", 0]
        }"#,
    )
    .unwrap();
    analyzer.apply_remote_verdict(&mut analysis, &rejected);

    assert_eq!(analysis.markers().len(), 1);
    let marker = &analysis.markers()[0];
    assert_eq!(marker.code(), Some(ErrorCode::E500));
    assert_eq!((marker.line(), marker.column()), (8, 19));
    assert!(marker.message().contains("unknown receiver type"));
    assert!(analysis.has_errors());
}

#[test]
fn test_markers_serialize_with_positions() {
    let analysis = analyze("receivers:\n  idle:\n");
    let json = serde_json::to_value(analysis.markers()).unwrap();
    assert_eq!(json[0]["severity"], "warning");
    assert_eq!(json[0]["code"], "E201");
    assert_eq!(json[0]["line"], 2);
    assert_eq!(json[0]["column"], 3);
}
