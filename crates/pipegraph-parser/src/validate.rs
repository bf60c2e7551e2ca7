//! Cross-reference validation between declared and referenced components.
//!
//! Two kinds of findings are produced:
//!
//! - **Undefined** (error): a referenced name is declared neither in its
//!   role's section nor under `connectors`. Reported at the reference.
//! - **Unused** (warning): a declared name is never referenced in its role.
//!   Reported at the declaration and suppressed while an external
//!   distribution validator is active.

use std::collections::HashSet;

use log::debug;

use pipegraph_core::component::{Role, Section};

use crate::{
    error::{Diagnostic, ErrorCode, Severity},
    references::References,
    span::Span,
};

/// Switches that change which findings are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// An external distribution validator covers completeness checks, so
    /// local unused warnings are not reported.
    pub distribution_validation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindingKind {
    Undefined,
    Unused,
}

/// A single cross-reference problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFinding {
    pub kind: FindingKind,
    /// Section the name belongs (or should belong) to
    pub section: Section,
    pub name: String,
    pub span: Span,
    /// Pipeline of the offending reference, for undefined names
    pub pipeline: Option<String>,
}

impl ReferenceFinding {
    pub fn severity(&self) -> Severity {
        match self.kind {
            FindingKind::Undefined => Severity::Error,
            FindingKind::Unused => Severity::Warning,
        }
    }

    pub fn offset(&self) -> usize {
        self.span.start()
    }

    pub fn code(&self) -> ErrorCode {
        match self.kind {
            FindingKind::Undefined => ErrorCode::E200,
            FindingKind::Unused => ErrorCode::E201,
        }
    }

    pub fn message(&self) -> String {
        let noun = self.section.singular();
        match self.kind {
            FindingKind::Undefined => format!("{noun} `{}` is not defined", self.name),
            FindingKind::Unused => format!("{noun} `{}` is declared but never used", self.name),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self.kind {
            FindingKind::Undefined => {
                let label = match &self.pipeline {
                    Some(pipeline) => format!("referenced by pipeline `{pipeline}`"),
                    None => "referenced here".to_string(),
                };
                Diagnostic::error(self.message())
                    .with_code(self.code())
                    .with_label(self.span, label)
                    .with_help(format!(
                        "declare `{}` under `{}` or `connectors`",
                        self.name, self.section
                    ))
            }
            FindingKind::Unused => Diagnostic::warning(self.message())
                .with_code(self.code())
                .with_label(self.span, "declared here")
                .with_help(format!(
                    "reference it from a pipeline or remove it from `{}`",
                    self.section
                )),
        }
    }
}

/// Compares declared and referenced names.
///
/// Findings are sorted by offset; findings at the same offset keep the order
/// in which they were generated. Nothing is deduplicated.
pub fn validate_references(
    references: &References,
    options: ValidationOptions,
) -> Vec<ReferenceFinding> {
    let declared_names = |section: Section| {
        references
            .declared(section)
            .iter()
            .map(|c| c.name.as_str())
            .collect::<HashSet<_>>()
    };
    let connectors = declared_names(Section::Connectors);

    let mut findings = Vec::new();

    for role in Role::ALL {
        let section = role.section();
        let declared = declared_names(section);
        for reference in references.referenced(role) {
            let name = reference.name.as_str();
            if !declared.contains(name) && !connectors.contains(name) {
                findings.push(ReferenceFinding {
                    kind: FindingKind::Undefined,
                    section,
                    name: reference.name.clone(),
                    span: reference.span,
                    pipeline: reference.pipeline.clone(),
                });
            }
        }
    }

    if !options.distribution_validation {
        let used: Vec<(Role, HashSet<&str>)> = Role::ALL
            .into_iter()
            .map(|role| {
                let names = references
                    .referenced(role)
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect();
                (role, names)
            })
            .collect();

        for section in Section::ALL {
            for declaration in references.declared(section) {
                let is_used = used.iter().any(|(role, names)| {
                    section.roles().contains(role) && names.contains(declaration.name.as_str())
                });
                if !is_used {
                    findings.push(ReferenceFinding {
                        kind: FindingKind::Unused,
                        section,
                        name: declaration.name.clone(),
                        span: declaration.span,
                        pipeline: None,
                    });
                }
            }
        }
    }

    findings.sort_by_key(ReferenceFinding::offset);

    debug!(
        findings = findings.len(),
        distribution_validation = options.distribution_validation;
        "Validated component references"
    );
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_document, references::extract_references};

    fn findings(source: &str, distribution_validation: bool) -> Vec<ReferenceFinding> {
        let document = parse_document(source).expect("document should parse");
        validate_references(
            &extract_references(&document),
            ValidationOptions {
                distribution_validation,
            },
        )
    }

    const CONNECTED: &str = "\
receivers:
  otlp:
processors:
  batch:
exporters:
  debug:
connectors:
  forward:
service:
  pipelines:
    traces:
      receivers: [otlp]
      processors: [batch]
      exporters: [forward]
    traces/out:
      receivers: [forward]
      exporters: [debug]
";

    #[test]
    fn test_clean_document_has_no_findings() {
        assert!(findings(CONNECTED, false).is_empty());
    }

    #[test]
    fn test_connector_used_on_one_side_counts_as_used() {
        let source = CONNECTED.replace("receivers: [forward]", "receivers: [otlp]");
        assert!(findings(&source, false).is_empty());
    }

    #[test]
    fn test_undefined_reports_reference_offset() {
        let source = "\
receivers:
  otlp:
service:
  pipelines:
    traces:
      receivers: [otlp, item6E]
";
        let result = findings(source, false);
        assert_eq!(result.len(), 1);
        let finding = &result[0];
        assert_eq!(finding.kind, FindingKind::Undefined);
        assert_eq!(finding.name, "item6E");
        assert_eq!(finding.section, Section::Receivers);
        assert_eq!(finding.offset(), source.find("item6E").unwrap());
        assert_eq!(finding.pipeline.as_deref(), Some("traces"));
        assert_eq!(finding.severity(), Severity::Error);
    }

    #[test]
    fn test_unused_suppressed_by_distribution_validation() {
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
        let result = findings(source, false);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, FindingKind::Unused);
        assert_eq!(result[0].name, "item5");
        assert_eq!(result[0].offset(), source.find("item5").unwrap());
        assert_eq!(result[0].severity(), Severity::Warning);

        assert!(findings(source, true).is_empty());
    }

    #[test]
    fn test_undefined_not_suppressed_by_distribution_validation() {
        let source = "service:\n  extensions: [zpages]\n";
        let result = findings(source, true);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].section, Section::Extensions);
    }

    #[test]
    fn test_repeated_references_are_not_deduplicated() {
        let source = "\
service:
  pipelines:
    a:
      exporters: [ghost]
    b:
      exporters: [ghost]
";
        let result = findings(source, false);
        assert_eq!(result.len(), 2);
        assert!(result[0].offset() < result[1].offset());
    }

    #[test]
    fn test_diagnostic_codes() {
        let source = "receivers:\n  idle:\nservice:\n  extensions: [missing]\n";
        let diagnostics: Vec<_> = findings(source, false)
            .iter()
            .map(ReferenceFinding::to_diagnostic)
            .collect();
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E201));
        assert_eq!(diagnostics[1].code(), Some(ErrorCode::E200));
        assert!(diagnostics[1].message().contains("missing"));
    }
}
