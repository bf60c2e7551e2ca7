//! Pipegraph Core Types
//!
//! This crate provides the vocabulary shared by the parser, graph and layout
//! crates. It includes:
//!
//! - **Components**: configuration sections, pipeline roles and node kinds
//!   ([`component`] module)
//! - **Geometry**: points, sizes, bounds and insets used by the layout
//!   ([`geometry`] module)

pub mod component;
pub mod geometry;
