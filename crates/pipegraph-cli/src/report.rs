//! JSON export of an analysis.

use std::io;

use serde::Serialize;

use pipegraph::{
    Analysis, Marker, PipegraphError, cycles::CycleSet, layout::Layout,
    structure::ComponentGraph,
};

#[derive(Serialize)]
struct Report<'a> {
    pipelines: Vec<&'a str>,
    graph: &'a ComponentGraph,
    cycles: &'a CycleSet,
    layout: &'a Layout,
    markers: &'a [Marker],
}

/// Pretty JSON of the graph, cycles, layout and markers.
///
/// Returns `None` when the document did not parse.
pub fn to_json(analysis: &Analysis) -> Result<Option<String>, PipegraphError> {
    let (Some(graph), Some(layout)) = (analysis.graph(), analysis.layout()) else {
        return Ok(None);
    };
    let report = Report {
        pipelines: analysis.pipeline_graph().pipelines().collect(),
        graph,
        cycles: analysis.cycles(),
        layout,
        markers: analysis.markers(),
    };
    let json = serde_json::to_string_pretty(&report).map_err(io::Error::from)?;
    Ok(Some(json))
}

#[cfg(test)]
mod tests {
    use pipegraph::Analyzer;

    use super::*;

    #[test]
    fn test_report_shape() {
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
";
        let analysis = Analyzer::default().analyze(source).unwrap();
        let json = to_json(&analysis).unwrap().expect("document parses");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["pipelines"][0], "traces");
        assert_eq!(value["graph"]["nodes"][0]["id"], "traces:receiver:otlp");
        assert_eq!(value["graph"]["edges"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["cycles"]["cycles"].as_array().map(Vec::len), Some(0));
        assert_eq!(value["layout"]["groups"][0]["pipelineId"], "traces");
    }

    #[test]
    fn test_no_report_without_document() {
        let analysis = Analyzer::default().analyze("a: [b\n").unwrap();
        assert!(to_json(&analysis).unwrap().is_none());
    }
}
