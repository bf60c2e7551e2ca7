//! Component vocabulary of a pipeline configuration.
//!
//! A configuration declares components in five top-level [`Section`]s and
//! references them from pipelines in one of four [`Role`]s. Graph nodes are
//! created for the three pipeline roles and carry a [`NodeKind`].

use std::fmt;

use serde::Serialize;

/// A top-level section that declares components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Receivers,
    Processors,
    Exporters,
    Extensions,
    Connectors,
}

impl Section {
    /// All sections in the order they are reported.
    pub const ALL: [Section; 5] = [
        Section::Receivers,
        Section::Processors,
        Section::Exporters,
        Section::Extensions,
        Section::Connectors,
    ];

    /// Returns the document key of this section.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Receivers => "receivers",
            Section::Processors => "processors",
            Section::Exporters => "exporters",
            Section::Extensions => "extensions",
            Section::Connectors => "connectors",
        }
    }

    /// Looks up a section by its document key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.as_str() == key)
    }

    /// Returns the roles in which a component of this section may be referenced.
    ///
    /// Connectors are the only components usable in two roles.
    pub fn roles(&self) -> &'static [Role] {
        match self {
            Section::Receivers => &[Role::Receivers],
            Section::Processors => &[Role::Processors],
            Section::Exporters => &[Role::Exporters],
            Section::Extensions => &[Role::Extensions],
            Section::Connectors => &[Role::Receivers, Role::Exporters],
        }
    }

    /// Returns the singular noun used in messages ("receiver", "connector", ...).
    pub fn singular(&self) -> &'static str {
        match self {
            Section::Receivers => "receiver",
            Section::Processors => "processor",
            Section::Exporters => "exporter",
            Section::Extensions => "extension",
            Section::Connectors => "connector",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role in which a component name is referenced from `service`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Receivers,
    Processors,
    Exporters,
    Extensions,
}

impl Role {
    /// All roles in the order they are reported.
    pub const ALL: [Role; 4] = [
        Role::Receivers,
        Role::Processors,
        Role::Exporters,
        Role::Extensions,
    ];

    /// The roles that appear inside a pipeline definition.
    pub const PIPELINE: [Role; 3] = [Role::Receivers, Role::Processors, Role::Exporters];

    /// Returns the document key of this role.
    pub fn as_str(&self) -> &'static str {
        self.section().as_str()
    }

    /// Returns the section in which components of this role are declared.
    pub fn section(&self) -> Section {
        match self {
            Role::Receivers => Section::Receivers,
            Role::Processors => Section::Processors,
            Role::Exporters => Section::Exporters,
            Role::Extensions => Section::Extensions,
        }
    }

    /// Returns the node kind for roles that produce graph nodes.
    pub fn node_kind(&self) -> Option<NodeKind> {
        match self {
            Role::Receivers => Some(NodeKind::Receiver),
            Role::Processors => Some(NodeKind::Processor),
            Role::Exporters => Some(NodeKind::Exporter),
            Role::Extensions => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of a node in the component graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Receiver,
    Processor,
    Exporter,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Receiver => "receiver",
            NodeKind::Processor => "processor",
            NodeKind::Exporter => "exporter",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_from_key() {
        assert_eq!(Section::from_key("receivers"), Some(Section::Receivers));
        assert_eq!(Section::from_key("connectors"), Some(Section::Connectors));
        assert_eq!(Section::from_key("service"), None);
    }

    #[test]
    fn test_connector_roles() {
        assert_eq!(
            Section::Connectors.roles(),
            &[Role::Receivers, Role::Exporters]
        );
        assert_eq!(Section::Processors.roles(), &[Role::Processors]);
    }

    #[test]
    fn test_role_section_and_kind() {
        assert_eq!(Role::Exporters.section(), Section::Exporters);
        assert_eq!(Role::Processors.node_kind(), Some(NodeKind::Processor));
        assert_eq!(Role::Extensions.node_kind(), None);
        assert_eq!(Role::Extensions.to_string(), "extensions");
    }
}
