//! Data Models
//!
//! This module contains the node records of the alignment hierarchy:
//!
//! - `NodeBase` - common record shared by every node
//! - Typed variants (Subcomponent, Capability, Function, ...) that flatten a
//!   `NodeBase` and add their own relationship lists
//! - `AnyNode` - tagged sum used by collections and reconstruction
//!
//! Levels are fixed by `NodeType`; records store references to other nodes
//! by id only.

mod any_node;
mod capability_node;
mod function_node;
mod integration_node;
mod io_node;
mod node;
pub(crate) mod relations;
mod specification_node;
mod structural_node;
mod subcomponent_node;

pub use any_node::AnyNode;
pub use capability_node::CapabilityNode;
pub use function_node::{FunctionNode, IntegrationPoint, Parameter};
pub use integration_node::{Constraint, Dependency, IntegrationNode};
pub use io_node::{
    Frequency, InputNode, IoFormat, IoSpec, OutputNode, SourceConnection, TargetConnection,
    ValidationRule,
};
pub use node::{NodeBase, NodeType, Permissions, Position, ValidationError, VersionSnapshot};
pub use specification_node::{Priority, Requirement, SpecificationNode, Standard};
pub use structural_node::{StructuralNode, STRUCTURAL_TYPES};
pub use subcomponent_node::{SecurityLevel, SubcomponentNode};
