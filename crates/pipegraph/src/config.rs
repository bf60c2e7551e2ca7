//! Configuration types for Pipegraph analysis.
//!
//! All types implement [`serde::Deserialize`] with every field defaulted, so a
//! partial TOML file (or none at all) yields a usable configuration.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout and validation.
//! - [`LayoutConfig`] - Node sizes and spacing used by the layout engine.
//! - [`ValidationConfig`] - Switches for reference validation and cycle search.
//!
//! # Example
//!
//! ```
//! # use pipegraph::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.validation().max_cycles(), 10_000);
//! assert!(!config.validation().distribution_validation());
//! ```

use serde::Deserialize;

use pipegraph_core::geometry::{Insets, Size};

/// Top-level configuration combining layout and validation settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Validation configuration section.
    #[serde(default)]
    validation: ValidationConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its two sections.
    pub fn new(layout: LayoutConfig, validation: ValidationConfig) -> Self {
        Self { layout, validation }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the validation configuration.
    pub fn validation(&self) -> &ValidationConfig {
        &self.validation
    }

    /// Returns a mutable reference to the validation configuration.
    ///
    /// Used by adapters to apply command-line overrides on top of a file.
    pub fn validation_mut(&mut self) -> &mut ValidationConfig {
        &mut self.validation
    }
}

/// Sizes and spacing for the layout engine, in layout units.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    node_width: f32,
    node_height: f32,
    /// Gap between nodes of a group, and between stacked groups
    node_spacing: f32,
    /// Gap between pipeline ranks
    rank_spacing: f32,
    group_padding: f32,
    /// Vertical distance between stacked back-edge paths
    back_edge_padding: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 160.0,
            node_height: 40.0,
            node_spacing: 24.0,
            rank_spacing: 80.0,
            group_padding: 20.0,
            back_edge_padding: 30.0,
        }
    }
}

impl LayoutConfig {
    pub fn node_size(&self) -> Size {
        Size::new(self.node_width, self.node_height)
    }

    pub fn node_spacing(&self) -> f32 {
        self.node_spacing
    }

    pub fn rank_spacing(&self) -> f32 {
        self.rank_spacing
    }

    /// Padding inside every pipeline group.
    pub fn group_padding(&self) -> Insets {
        Insets::uniform(self.group_padding)
    }

    pub fn back_edge_padding(&self) -> f32 {
        self.back_edge_padding
    }
}

/// Settings for reference validation and cycle enumeration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// An external distribution validator is active; unused warnings are
    /// suppressed.
    distribution_validation: bool,

    /// Upper bound on the number of enumerated simple cycles.
    max_cycles: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            distribution_validation: false,
            max_cycles: 10_000,
        }
    }
}

impl ValidationConfig {
    pub fn new(distribution_validation: bool, max_cycles: usize) -> Self {
        Self {
            distribution_validation,
            max_cycles,
        }
    }

    pub fn distribution_validation(&self) -> bool {
        self.distribution_validation
    }

    pub fn set_distribution_validation(&mut self, enabled: bool) -> &mut Self {
        self.distribution_validation = enabled;
        self
    }

    pub fn max_cycles(&self) -> usize {
        self.max_cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.layout().node_size(), Size::new(160.0, 40.0));
        assert_eq!(config.layout().back_edge_padding(), 30.0);
        assert_eq!(config.validation().max_cycles(), 10_000);
    }

    #[test]
    fn test_override_distribution_validation() {
        let mut config = AppConfig::default();
        config.validation_mut().set_distribution_validation(true);
        assert!(config.validation().distribution_validation());
    }
}
