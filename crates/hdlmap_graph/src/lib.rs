//! Module instantiation graph for a scanned project.
//!
//! The [`DependencyGraph`] holds every declared module name as a node and one
//! edge per distinct resolved (parent, child) pair, indexed in both
//! directions. Traversals are cycle-safe; [`DependencyGraph::cycles`] reports
//! the strongly connected components so callers can warn about them.

#![warn(missing_docs)]

pub mod graph;

pub use graph::{DependencyGraph, UnresolvedRef};
