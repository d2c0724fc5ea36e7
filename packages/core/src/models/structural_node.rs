//! Structural nodes
//!
//! Tree levels that carry no domain payload of their own: the component group
//! (root), components, techniques and applications. They only track child ids.

use crate::behaviors::NodeBehavior;
use crate::events::{Mutation, Relation};
use crate::models::relations::{add_reference, remove_reference, Owner};
use crate::models::{NodeBase, NodeType, ValidationError};
use serde::{Deserialize, Serialize};

/// Types that may be represented by [`StructuralNode`]
pub const STRUCTURAL_TYPES: [NodeType; 4] = [
    NodeType::ComponentGroup,
    NodeType::Component,
    NodeType::Technique,
    NodeType::Application,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralNode {
    #[serde(flatten)]
    pub base: NodeBase,

    #[serde(rename = "type")]
    node_type: NodeType,

    #[serde(default)]
    children: Vec<String>,
}

impl StructuralNode {
    /// Wrap a base record as a structural node of `node_type`
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidNodeType` for types that carry a
    /// domain payload (capability, function, ...).
    pub fn new(base: NodeBase, node_type: NodeType) -> Result<Self, ValidationError> {
        if !Self::accepts_type(node_type) {
            return Err(ValidationError::InvalidNodeType(format!(
                "'{}' is not a structural node type",
                node_type
            )));
        }
        Ok(Self {
            base,
            node_type,
            children: Vec::new(),
        })
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn add_child(&mut self, child_id: &str) -> Mutation {
        let owner = Owner::new(self.node_type, &self.base.id);
        add_reference(&mut self.children, owner, Relation::Child, child_id)
    }

    pub fn remove_child(&mut self, child_id: &str) -> Mutation {
        let owner = Owner::new(self.node_type, &self.base.id);
        remove_reference(&mut self.children, owner, Relation::Child, child_id)
    }
}

impl NodeBehavior for StructuralNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn node_type(&self) -> NodeType {
        self.node_type
    }

    fn accepts_type(node_type: NodeType) -> bool {
        STRUCTURAL_TYPES.contains(&node_type)
    }
}
