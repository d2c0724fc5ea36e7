//! Business Services
//!
//! This module contains the services built on top of the node model:
//!
//! - `HierarchySource` - Raw hierarchy records (JSON directory or in-memory)
//! - `graph_builder` - Snapshot to node/link graph, hierarchy paths
//! - `NodeService` - Node ownership, mutation dispatch and bulk loading

pub mod error;
pub mod graph_builder;
pub mod hierarchy_source;
pub mod node_service;

pub use error::NodeServiceError;
pub use graph_builder::{build_graph, GraphData, GraphLink, LinkType, PathEntry};
pub use hierarchy_source::{
    default_root, DataPaths, HierarchySnapshot, HierarchySource, InMemorySource,
    JsonDirectorySource,
};
pub use node_service::{LoadSummary, NodeService};

#[cfg(test)]
mod graph_builder_test;

#[cfg(test)]
mod node_service_test;
