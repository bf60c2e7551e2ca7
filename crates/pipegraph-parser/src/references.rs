//! Extraction of declared and referenced component names.
//!
//! Declarations are the keys of the five top-level component sections.
//! References are the entries of every pipeline's `receivers`, `processors`
//! and `exporters` lists and of `service.extensions`.

use indexmap::IndexMap;
use log::debug;

use pipegraph_core::component::{Role, Section};

use crate::{
    document::{Document, Item, Value},
    span::{Span, Spanned},
};

/// One occurrence of a component name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRef {
    pub name: String,
    pub span: Span,
    /// Owning pipeline for references made inside a pipeline definition
    pub pipeline: Option<String>,
}

impl ComponentRef {
    fn new(name: impl Into<String>, span: Span, pipeline: Option<&str>) -> Self {
        Self {
            name: name.into(),
            span,
            pipeline: pipeline.map(str::to_string),
        }
    }

    pub fn offset(&self) -> usize {
        self.span.start()
    }
}

/// A pipeline under `service.pipelines`.
#[derive(Debug, Clone)]
pub struct PipelineDefinition {
    pub id: Spanned<String>,
    /// Span of the whole definition, key included
    pub span: Span,
    pub receivers: Vec<ComponentRef>,
    pub processors: Vec<ComponentRef>,
    pub exporters: Vec<ComponentRef>,
    /// False when the definition is not a mapping of component lists
    pub well_formed: bool,
}

impl PipelineDefinition {
    pub fn id(&self) -> &str {
        self.id.inner()
    }

    /// Entries of one pipeline role; extensions never appear in a pipeline.
    pub fn role(&self, role: Role) -> &[ComponentRef] {
        match role {
            Role::Receivers => &self.receivers,
            Role::Processors => &self.processors,
            Role::Exporters => &self.exporters,
            Role::Extensions => &[],
        }
    }
}

/// Declared and referenced component names of a document.
///
/// Every section and role is present in the maps, absent ones with an empty
/// list.
#[derive(Debug, Clone)]
pub struct References {
    declared: IndexMap<Section, Vec<ComponentRef>>,
    referenced: IndexMap<Role, Vec<ComponentRef>>,
    pipelines: Vec<PipelineDefinition>,
}

impl Default for References {
    fn default() -> Self {
        Self {
            declared: Section::ALL.into_iter().map(|s| (s, Vec::new())).collect(),
            referenced: Role::ALL.into_iter().map(|r| (r, Vec::new())).collect(),
            pipelines: Vec::new(),
        }
    }
}

impl References {
    /// Walks `document` and collects every declaration and reference.
    pub fn extract(document: &Document) -> Self {
        let mut refs = Self::default();

        for section in Section::ALL {
            let Some(item) = document.get(section.as_str()) else {
                continue;
            };
            if let Some(components) = item.value.as_mapping() {
                refs.declared[&section].extend(
                    components
                        .iter()
                        .map(|c| ComponentRef::new(c.key(), c.key.span(), None)),
                );
            }
        }

        if let Some(service) = document.get("service") {
            if let Some(extensions) = service.value.get("extensions") {
                refs.referenced[&Role::Extensions] = component_list(&extensions.value, None);
            }
            if let Some(pipelines) = service.value.get("pipelines") {
                for pipeline in pipelines.value.as_mapping().unwrap_or_default() {
                    let definition = pipeline_definition(pipeline);
                    for role in Role::PIPELINE {
                        refs.referenced[&role].extend(definition.role(role).iter().cloned());
                    }
                    refs.pipelines.push(definition);
                }
            }
        }

        debug!(
            declared = refs.declared.values().map(Vec::len).sum::<usize>(),
            referenced = refs.referenced.values().map(Vec::len).sum::<usize>(),
            pipelines = refs.pipelines.len();
            "Extracted component references"
        );
        refs
    }

    /// Declarations of one section in document order.
    pub fn declared(&self, section: Section) -> &[ComponentRef] {
        self.declared.get(&section).map_or(&[], Vec::as_slice)
    }

    /// References made in one role in document order.
    pub fn referenced(&self, role: Role) -> &[ComponentRef] {
        self.referenced.get(&role).map_or(&[], Vec::as_slice)
    }

    pub fn declared_by_section(&self) -> &IndexMap<Section, Vec<ComponentRef>> {
        &self.declared
    }

    pub fn referenced_by_role(&self) -> &IndexMap<Role, Vec<ComponentRef>> {
        &self.referenced
    }

    pub fn pipelines(&self) -> &[PipelineDefinition] {
        &self.pipelines
    }

    pub fn is_declared(&self, section: Section, name: &str) -> bool {
        self.declared(section).iter().any(|c| c.name == name)
    }

    /// Whether `name` is declared under `connectors`.
    pub fn is_connector(&self, name: &str) -> bool {
        self.is_declared(Section::Connectors, name)
    }

    /// True when nothing was declared or referenced.
    pub fn is_empty(&self) -> bool {
        self.declared.values().all(Vec::is_empty)
            && self.referenced.values().all(Vec::is_empty)
            && self.pipelines.is_empty()
    }
}

fn pipeline_definition(item: &Item) -> PipelineDefinition {
    let id = item.key.clone();
    let well_formed = matches!(item.value, Value::Mapping(_));
    let list = |role: Role| {
        item.value
            .get(role.as_str())
            .map(|entry| component_list(&entry.value, Some(id.inner())))
            .unwrap_or_default()
    };

    PipelineDefinition {
        receivers: list(Role::Receivers),
        processors: list(Role::Processors),
        exporters: list(Role::Exporters),
        span: item.span(),
        well_formed,
        id,
    }
}

/// Scalar entries of a component list. A lone scalar counts as a one-entry
/// list; other entries are ignored.
fn component_list(value: &Value, pipeline: Option<&str>) -> Vec<ComponentRef> {
    match value {
        Value::Sequence(entries) => entries
            .iter()
            .filter_map(Value::as_scalar)
            .map(|name| ComponentRef::new(name.inner(), name.span(), pipeline))
            .collect(),
        Value::Scalar(name) => vec![ComponentRef::new(name.inner(), name.span(), pipeline)],
        Value::Null(_) | Value::Mapping(_) => Vec::new(),
    }
}

/// Extracts the references of a parsed document.
pub fn extract_references(document: &Document) -> References {
    References::extract(document)
}
