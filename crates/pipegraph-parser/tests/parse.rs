use pipegraph_core::component::{Role, Section};
use pipegraph_parser::{
    Document, ErrorCode, FindingKind, Item, ValidationOptions, Value, extract_references,
    locate::find_line_and_column, parse_document, validate_references,
};
use proptest::prelude::*;

const COLLECTOR_CONFIG: &str = r#"# Example collector configuration
receivers:
  otlp:
    protocols:
      grpc:
        endpoint: "0.0.0.0:4317"
      http:
  filelog/app:
    include: [/var/log/app/*.log]

processors:
  batch:
    timeout: 5s
  memory_limiter:
    check_interval: 1s
    limit_percentage: 80

exporters:
  debug:
    verbosity: detailed
  otlp/backend:
    endpoint: backend:4317
    tls:
      insecure: true

connectors:
  spanmetrics:

extensions:
  health_check:

service:
  extensions: [health_check]
  pipelines:
    traces:
      receivers: [otlp]
      processors: [memory_limiter, batch]
      exporters: [otlp/backend, spanmetrics]
    metrics:
      receivers:
        - spanmetrics
      exporters:
        - debug
    logs:
      receivers: [filelog/app]
      processors: [batch]
      exporters: [debug]
"#;

#[test]
fn test_collector_config_structure() {
    let document = parse_document(COLLECTOR_CONFIG).expect("Failed to parse");

    let keys: Vec<_> = document.items().iter().map(Item::key).collect();
    assert_eq!(
        keys,
        vec![
            "receivers",
            "processors",
            "exporters",
            "connectors",
            "extensions",
            "service"
        ]
    );

    let endpoint = document
        .lookup(&["receivers", "otlp", "protocols", "grpc", "endpoint"])
        .and_then(|item| item.value.as_scalar())
        .expect("endpoint should be a scalar");
    assert_eq!(endpoint.inner(), "0.0.0.0:4317");

    let insecure = document
        .lookup(&["exporters", "otlp/backend", "tls", "insecure"])
        .expect("insecure should exist");
    assert_eq!(
        find_line_and_column(COLLECTOR_CONFIG, insecure.key_offset() as i64),
        (24, 7)
    );
}

#[test]
fn test_collector_config_references() {
    let document = parse_document(COLLECTOR_CONFIG).expect("Failed to parse");
    let references = extract_references(&document);

    let declared: Vec<_> = references
        .declared(Section::Receivers)
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(declared, vec!["otlp", "filelog/app"]);

    let pipelines: Vec<_> = references.pipelines().iter().map(|p| p.id()).collect();
    assert_eq!(pipelines, vec!["traces", "metrics", "logs"]);

    let receivers: Vec<_> = references
        .referenced(Role::Receivers)
        .iter()
        .map(|c| (c.name.as_str(), c.pipeline.as_deref()))
        .collect();
    assert_eq!(
        receivers,
        vec![
            ("otlp", Some("traces")),
            ("spanmetrics", Some("metrics")),
            ("filelog/app", Some("logs")),
        ]
    );

    let findings = validate_references(&references, ValidationOptions::default());
    assert!(findings.is_empty(), "unexpected findings: {findings:?}");
}

#[test]
fn test_undefined_and_unused_positions() {
    let source = "\
receivers:
  item5:
  otlp:
exporters:
  debug:
service:
  pipelines:
    traces:
      receivers: [otlp, item6E]
      exporters: [debug]
";
    let document = parse_document(source).expect("Failed to parse");
    let findings = validate_references(&extract_references(&document), ValidationOptions::default());

    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].kind, FindingKind::Unused);
    assert_eq!(
        find_line_and_column(source, findings[0].offset() as i64),
        (2, 3)
    );
    assert_eq!(findings[1].kind, FindingKind::Undefined);
    assert_eq!(
        find_line_and_column(source, findings[1].offset() as i64),
        (9, 25)
    );
}

#[test]
fn test_structural_error_has_position() {
    let source = "receivers:\n  otlp:\n bad: 1\n";
    let err = parse_document(source).expect_err("bad indentation should fail");
    let diagnostic = err.primary().expect("at least one diagnostic");

    assert_eq!(diagnostic.code(), Some(ErrorCode::E100));
    let span = diagnostic.primary_span().expect("a labelled span");
    assert_eq!(find_line_and_column(source, span.start() as i64), (3, 2));
}

#[test]
fn test_deeply_nested_input_is_rejected() {
    let brackets = format!("a: {}{}\n", "[".repeat(5000), "]".repeat(5000));
    let braces = format!("a: {}\n", "{b: ".repeat(5000) + &"}".repeat(5000));
    let dashes = format!("{}x\n", "- ".repeat(5000));
    let keys = format!("a: [{}x]\n", "k: ".repeat(5000));

    for source in [&brackets, &braces, &dashes, &keys] {
        let err = parse_document(source).expect_err("deep nesting should fail");
        let diagnostic = err.primary().expect("at least one diagnostic");
        assert_eq!(diagnostic.code(), Some(ErrorCode::E105));
    }
}

#[test]
fn test_anchored_pipelines_resolve_references() {
    let source = "\
receivers:
  otlp:
  jaeger:
exporters:
  debug:
service:
  pipelines:
    traces:
      receivers: &shared [otlp,
                          jaeger]
      exporters: &sinks [debug]
    traces/2:
      receivers: *shared
      exporters: *sinks
";
    let document = parse_document(source).expect("Failed to parse");
    let references = extract_references(&document);

    let pipelines: Vec<_> = references.pipelines().iter().map(|p| p.id()).collect();
    assert_eq!(pipelines, vec!["traces", "traces/2"]);

    let receivers: Vec<_> = references
        .referenced(Role::Receivers)
        .iter()
        .map(|c| (c.name.as_str(), c.pipeline.as_deref()))
        .collect();
    assert_eq!(
        receivers,
        vec![
            ("otlp", Some("traces")),
            ("jaeger", Some("traces")),
            ("otlp", Some("traces/2")),
            ("jaeger", Some("traces/2")),
        ]
    );

    let findings = validate_references(&references, ValidationOptions::default());
    assert!(findings.is_empty(), "unexpected findings: {findings:?}");
}

// ===================
// Property tests
// ===================

/// Keys and scalars that need no quoting.
fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}(/[a-z0-9]{1,4})?"
}

#[derive(Debug, Clone)]
enum Entry {
    Scalar(String, String),
    List(String, Vec<String>),
    Nested(String, Vec<(String, String)>),
}

fn entry_strategy() -> impl Strategy<Value = Entry> {
    prop_oneof![
        (name_strategy(), name_strategy()).prop_map(|(k, v)| Entry::Scalar(k, v)),
        (name_strategy(), prop::collection::vec(name_strategy(), 0..4))
            .prop_map(|(k, v)| Entry::List(k, v)),
        (
            name_strategy(),
            prop::collection::vec((name_strategy(), name_strategy()), 1..4)
        )
            .prop_map(|(k, v)| Entry::Nested(k, v)),
    ]
}

fn render(entries: &[Entry], flow_lists: bool) -> String {
    let mut out = String::new();
    for entry in entries {
        match entry {
            Entry::Scalar(key, value) => out.push_str(&format!("{key}: {value}\n")),
            Entry::List(key, values) if flow_lists => {
                out.push_str(&format!("{key}: [{}]\n", values.join(", ")));
            }
            Entry::List(key, values) => {
                out.push_str(&format!("{key}:\n"));
                for value in values {
                    out.push_str(&format!("  - {value}\n"));
                }
            }
            Entry::Nested(key, pairs) => {
                out.push_str(&format!("{key}:\n"));
                for (k, v) in pairs {
                    out.push_str(&format!("  {k}: {v}\n"));
                }
            }
        }
    }
    out
}

fn check_sibling_offsets(items: &[Item]) -> Result<(), TestCaseError> {
    for pair in items.windows(2) {
        prop_assert!(pair[0].key_offset() <= pair[1].key_offset());
        prop_assert!(pair[0].key_offset() <= pair[0].value_offset());
    }
    for item in items {
        check_value_offsets(&item.value)?;
    }
    Ok(())
}

fn check_value_offsets(value: &Value) -> Result<(), TestCaseError> {
    match value {
        Value::Mapping(items) => check_sibling_offsets(items.inner())?,
        Value::Sequence(entries) => {
            for pair in entries.windows(2) {
                prop_assert!(pair[0].offset() <= pair[1].offset());
            }
            for entry in entries.iter() {
                check_value_offsets(entry)?;
            }
        }
        Value::Null(_) | Value::Scalar(_) => {}
    }
    Ok(())
}

/// Generated documents parse, keep every top-level entry and keep sibling
/// offsets in document order.
fn check_generated_document(entries: &[Entry], flow_lists: bool) -> Result<(), TestCaseError> {
    let source = render(entries, flow_lists);
    let document: Document = match parse_document(&source) {
        Ok(document) => document,
        Err(err) => return Err(TestCaseError::fail(format!("{err}\n{source}"))),
    };

    prop_assert_eq!(document.items().len(), entries.len());
    check_sibling_offsets(document.items())?;

    for item in document.items() {
        prop_assert_eq!(&source[item.key.span().start()..item.key.span().end()], item.key());
    }
    Ok(())
}

proptest! {
    #[test]
    fn generated_documents_keep_offsets(
        entries in prop::collection::vec(entry_strategy(), 0..8),
        flow_lists in any::<bool>(),
    ) {
        check_generated_document(&entries, flow_lists)?;
    }

    #[test]
    fn parser_never_panics(source in "[ -~\t\n]{0,300}") {
        let _ = parse_document(&source);
    }
}
