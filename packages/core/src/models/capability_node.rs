//! Capability nodes (level 3)

use crate::behaviors::NodeBehavior;
use crate::events::{Mutation, NodeEvent, Relation};
use crate::models::relations::{add_reference, remove_reference, Owner};
use crate::models::{NodeBase, NodeType};
use crate::visualization::{clamp_score, weighted, VisualPropertiesProvider};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A capability of a subcomponent, realized by functions
///
/// `required_capabilities` lists other capabilities this one depends on; a
/// capability can never require itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityNode {
    #[serde(flatten)]
    pub base: NodeBase,

    #[serde(default)]
    functions: Vec<String>,

    #[serde(default)]
    implemented_by_subcomponents: Vec<String>,

    #[serde(default)]
    required_capabilities: Vec<String>,

    #[serde(default)]
    capability_metrics: Map<String, Value>,
}

impl CapabilityNode {
    pub fn new(base: NodeBase) -> Self {
        Self {
            base,
            functions: Vec::new(),
            implemented_by_subcomponents: Vec::new(),
            required_capabilities: Vec::new(),
            capability_metrics: Map::new(),
        }
    }

    pub fn functions(&self) -> &[String] {
        &self.functions
    }

    pub fn implemented_by_subcomponents(&self) -> &[String] {
        &self.implemented_by_subcomponents
    }

    pub fn required_capabilities(&self) -> &[String] {
        &self.required_capabilities
    }

    pub fn capability_metrics(&self) -> &Map<String, Value> {
        &self.capability_metrics
    }

    pub fn add_function(&mut self, function_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Capability, &self.base.id);
        add_reference(&mut self.functions, owner, Relation::Function, function_id)
    }

    pub fn remove_function(&mut self, function_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Capability, &self.base.id);
        remove_reference(&mut self.functions, owner, Relation::Function, function_id)
    }

    pub fn add_implementing_subcomponent(&mut self, subcomponent_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Capability, &self.base.id);
        add_reference(
            &mut self.implemented_by_subcomponents,
            owner,
            Relation::ImplementingSubcomponent,
            subcomponent_id,
        )
    }

    pub fn remove_implementing_subcomponent(&mut self, subcomponent_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Capability, &self.base.id);
        remove_reference(
            &mut self.implemented_by_subcomponents,
            owner,
            Relation::ImplementingSubcomponent,
            subcomponent_id,
        )
    }

    /// Record a dependency on another capability (self-reference is rejected)
    pub fn add_required_capability(&mut self, capability_id: &str) -> Mutation {
        if capability_id == self.base.id {
            tracing::warn!("Capability {} cannot require itself", self.base.id);
            return Mutation::unchanged();
        }
        let owner = Owner::new(NodeType::Capability, &self.base.id);
        add_reference(
            &mut self.required_capabilities,
            owner,
            Relation::RequiredCapability,
            capability_id,
        )
    }

    pub fn remove_required_capability(&mut self, capability_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Capability, &self.base.id);
        remove_reference(
            &mut self.required_capabilities,
            owner,
            Relation::RequiredCapability,
            capability_id,
        )
    }

    /// Shallow-merge metric values (last write wins per key)
    pub fn update_metrics(&mut self, metrics: Map<String, Value>) -> Mutation {
        for (key, value) in metrics {
            self.capability_metrics.insert(key, value);
        }
        self.metrics_changed()
    }

    pub fn remove_metric(&mut self, key: &str) -> Mutation {
        if self.capability_metrics.remove(key).is_none() {
            return Mutation::unchanged();
        }
        self.metrics_changed()
    }

    fn metrics_changed(&self) -> Mutation {
        Mutation::applied(NodeEvent::FieldChanged {
            scope: Some(NodeType::Capability),
            node_id: self.base.id.clone(),
            field: "metrics".to_string(),
            value: Value::Object(self.capability_metrics.clone()),
        })
    }

    /// min(50, functions x 10) + min(30, implementers x 15) + min(20, metrics x 5)
    pub fn maturity_score(&self) -> u32 {
        clamp_score(
            weighted(self.functions.len(), 10, 50)
                + weighted(self.implemented_by_subcomponents.len(), 15, 30)
                + weighted(self.capability_metrics.len(), 5, 20),
        )
    }

    pub fn capability_visual_properties(
        &self,
        provider: Option<&dyn VisualPropertiesProvider>,
        role: &str,
    ) -> Map<String, Value> {
        let mut properties = self.visual_properties(provider, role);
        properties.insert("functionCount".to_string(), json!(self.functions.len()));
        properties.insert(
            "implementerCount".to_string(),
            json!(self.implemented_by_subcomponents.len()),
        );
        properties.insert(
            "dependencyCount".to_string(),
            json!(self.required_capabilities.len()),
        );
        properties.insert("maturity".to_string(), json!(self.maturity_score()));
        properties
    }
}

impl NodeBehavior for CapabilityNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn node_type(&self) -> NodeType {
        NodeType::Capability
    }

    fn accepts_type(node_type: NodeType) -> bool {
        node_type == NodeType::Capability
    }
}
