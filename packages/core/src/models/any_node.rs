//! Tagged sum over every node variant
//!
//! `AnyNode` is what collections hold. Reconstruction dispatches on the
//! record's `type` tag; shared behavior is forwarded to the wrapped variant.

use crate::behaviors::NodeBehavior;
use crate::crypto::UnlockedContent;
use crate::events::Mutation;
use crate::models::{
    CapabilityNode, FunctionNode, InputNode, IntegrationNode, NodeBase, NodeType, OutputNode,
    SpecificationNode, StructuralNode, SubcomponentNode, ValidationError,
};
use crate::visualization::VisualPropertiesProvider;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum AnyNode {
    Structural(StructuralNode),
    Subcomponent(SubcomponentNode),
    Capability(CapabilityNode),
    Function(FunctionNode),
    Specification(SpecificationNode),
    Integration(IntegrationNode),
    Input(InputNode),
    Output(OutputNode),
}

/// Forward a call to whichever variant is wrapped
macro_rules! each_variant {
    ($node:expr, $inner:ident => $body:expr) => {
        match $node {
            AnyNode::Structural($inner) => $body,
            AnyNode::Subcomponent($inner) => $body,
            AnyNode::Capability($inner) => $body,
            AnyNode::Function($inner) => $body,
            AnyNode::Specification($inner) => $body,
            AnyNode::Integration($inner) => $body,
            AnyNode::Input($inner) => $body,
            AnyNode::Output($inner) => $body,
        }
    };
}

impl AnyNode {
    /// Reconstruct the variant named by the record's `type` field
    ///
    /// # Errors
    ///
    /// - `ValidationError::MissingField` if `type` is absent
    /// - `ValidationError::InvalidNodeType` if it names no known variant
    /// - `ValidationError::MalformedRecord` if the fields do not fit the variant
    pub fn from_object(value: Value) -> Result<Self, ValidationError> {
        let node_type: NodeType = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ValidationError::MissingField("type".to_string()))?
            .parse()?;

        Ok(match node_type {
            NodeType::ComponentGroup
            | NodeType::Component
            | NodeType::Technique
            | NodeType::Application => AnyNode::Structural(StructuralNode::from_object(value)?),
            NodeType::Subcomponent => AnyNode::Subcomponent(SubcomponentNode::from_object(value)?),
            NodeType::Capability => AnyNode::Capability(CapabilityNode::from_object(value)?),
            NodeType::Function => AnyNode::Function(FunctionNode::from_object(value)?),
            NodeType::Specification => {
                AnyNode::Specification(SpecificationNode::from_object(value)?)
            }
            NodeType::Integration => AnyNode::Integration(IntegrationNode::from_object(value)?),
            NodeType::Input => AnyNode::Input(InputNode::from_object(value)?),
            NodeType::Output => AnyNode::Output(OutputNode::from_object(value)?),
        })
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    pub fn parent(&self) -> Option<&str> {
        self.base().parent.as_deref()
    }

    pub fn node_type(&self) -> NodeType {
        each_variant!(self, node => node.node_type())
    }

    pub fn level(&self) -> u8 {
        self.node_type().level()
    }

    pub fn base(&self) -> &NodeBase {
        each_variant!(self, node => node.base())
    }

    pub fn base_mut(&mut self) -> &mut NodeBase {
        each_variant!(self, node => node.base_mut())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        each_variant!(self, node => node.validate())
    }

    pub fn to_object(&self, include_details: bool) -> Value {
        each_variant!(self, node => node.to_object(include_details))
    }

    pub fn to_object_with_content(&self, include_details: bool, unlocked: &UnlockedContent) -> Value {
        each_variant!(self, node => node.to_object_with_content(include_details, unlocked))
    }

    pub fn to_safe_object(&self) -> Value {
        each_variant!(self, node => node.to_safe_object())
    }

    pub fn create_version(&mut self, user_id: &str, comment: &str) -> Mutation {
        each_variant!(self, node => node.create_version(user_id, comment))
    }

    pub fn revert_to_version(&mut self, version: u32, user_id: &str) -> Mutation {
        each_variant!(self, node => node.revert_to_version(version, user_id))
    }

    /// Variant-specific visual record (scores included where the variant has one)
    pub fn visual_properties(
        &self,
        provider: Option<&dyn VisualPropertiesProvider>,
        role: &str,
    ) -> Map<String, Value> {
        match self {
            AnyNode::Structural(node) => node.visual_properties(provider, role),
            AnyNode::Subcomponent(node) => node.subcomponent_visual_properties(provider, role),
            AnyNode::Capability(node) => node.capability_visual_properties(provider, role),
            AnyNode::Function(node) => node.function_visual_properties(provider, role),
            AnyNode::Specification(node) => node.specification_visual_properties(provider, role),
            AnyNode::Integration(node) => node.integration_visual_properties(provider, role),
            AnyNode::Input(node) => node.io_visual_properties(provider, role),
            AnyNode::Output(node) => node.io_visual_properties(provider, role),
        }
    }
}

impl From<StructuralNode> for AnyNode {
    fn from(node: StructuralNode) -> Self {
        AnyNode::Structural(node)
    }
}

impl From<SubcomponentNode> for AnyNode {
    fn from(node: SubcomponentNode) -> Self {
        AnyNode::Subcomponent(node)
    }
}

impl From<CapabilityNode> for AnyNode {
    fn from(node: CapabilityNode) -> Self {
        AnyNode::Capability(node)
    }
}

impl From<FunctionNode> for AnyNode {
    fn from(node: FunctionNode) -> Self {
        AnyNode::Function(node)
    }
}

impl From<SpecificationNode> for AnyNode {
    fn from(node: SpecificationNode) -> Self {
        AnyNode::Specification(node)
    }
}

impl From<IntegrationNode> for AnyNode {
    fn from(node: IntegrationNode) -> Self {
        AnyNode::Integration(node)
    }
}

impl From<InputNode> for AnyNode {
    fn from(node: InputNode) -> Self {
        AnyNode::Input(node)
    }
}

impl From<OutputNode> for AnyNode {
    fn from(node: OutputNode) -> Self {
        AnyNode::Output(node)
    }
}

/// Serializes as the detailed record (`to_object(true)`)
impl Serialize for AnyNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_object(true).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AnyNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        AnyNode::from_object(value).map_err(D::Error::custom)
    }
}
