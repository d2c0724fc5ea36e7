//! AlignViz Core
//!
//! This crate provides the node model, event channel and graph construction
//! behind the AlignViz hierarchy visualizer.
//!
//! # Architecture
//!
//! - **Typed nodes**: A shared `NodeBase` record plus one struct per node
//!   variant (subcomponent, capability, function, ...), unified by [`AnyNode`]
//! - **Mutations, not callbacks**: Mutators return a [`Mutation`] carrying the
//!   events they produced; [`EventBus`] publishes them
//! - **Plain records**: Every node converts to and from the JSON object shape
//!   the UI and data files use
//! - **Encrypted content**: Node content can be sealed with AES-256-GCM under a
//!   password-derived key
//!
//! # Modules
//!
//! - [`models`] - Node base record and the node variants
//! - [`behaviors`] - Shared node behavior (serialization, versioning, visuals)
//! - [`events`] - Node events, mutations and the event bus
//! - [`crypto`] - Content encryption
//! - [`visualization`] - Visual property providers and score helpers
//! - [`services`] - Hierarchy sources, graph builder, node service
//! - [`render`] - HTML details panel for node records
//! - [`utils`] - Shared string helpers

pub mod behaviors;
pub mod crypto;
pub mod events;
pub mod models;
pub mod render;
pub mod services;
pub mod utils;
pub mod visualization;

// Re-export commonly used types
pub use behaviors::NodeBehavior;
pub use events::{EventBus, Mutation, NodeEvent};
pub use models::*;
pub use services::*;
