//! Function nodes (level 4)
//!
//! A function realizes part of a capability. It references the specifications
//! that describe it and the nodes it integrates with, and carries its own call
//! signature details (signature text, parameters, return value).

use crate::behaviors::NodeBehavior;
use crate::events::{Mutation, NodeEvent, Relation, RelationChange};
use crate::models::relations::{
    add_keyed, add_reference, is_blank, reject, remove_keyed, remove_reference, Keyed, Owner,
};
use crate::models::{NodeBase, NodeType};
use crate::visualization::{clamp_score, weighted, VisualPropertiesProvider};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const DETAIL_FIELDS: &[&str] = &["function_signature", "parameters", "return_value"];

/// Link from a function to another node it exchanges data with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationPoint {
    pub target_id: String,
    pub integration_type: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// One named, typed function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: String::new(),
            required: false,
        }
    }
}

impl Keyed for Parameter {
    fn key(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionNode {
    #[serde(flatten)]
    pub base: NodeBase,

    #[serde(default)]
    specifications: Vec<String>,

    #[serde(default)]
    integration_points: Vec<IntegrationPoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_signature: Option<String>,

    #[serde(default)]
    parameters: Vec<Parameter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    return_value: Option<Value>,
}

impl FunctionNode {
    pub fn new(base: NodeBase) -> Self {
        Self {
            base,
            specifications: Vec::new(),
            integration_points: Vec::new(),
            function_signature: None,
            parameters: Vec::new(),
            return_value: None,
        }
    }

    fn owner(&self) -> Owner<'_> {
        Owner::new(NodeType::Function, &self.base.id)
    }

    pub fn specifications(&self) -> &[String] {
        &self.specifications
    }

    pub fn integration_points(&self) -> &[IntegrationPoint] {
        &self.integration_points
    }

    pub fn function_signature(&self) -> Option<&str> {
        self.function_signature.as_deref()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn return_value(&self) -> Option<&Value> {
        self.return_value.as_ref()
    }

    pub fn add_specification(&mut self, specification_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Function, &self.base.id);
        add_reference(
            &mut self.specifications,
            owner,
            Relation::Specification,
            specification_id,
        )
    }

    pub fn remove_specification(&mut self, specification_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Function, &self.base.id);
        remove_reference(
            &mut self.specifications,
            owner,
            Relation::Specification,
            specification_id,
        )
    }

    /// Add an integration point; duplicates are detected by target and type
    pub fn add_integration_point(&mut self, point: IntegrationPoint) -> Mutation {
        if is_blank(&point.target_id) || is_blank(&point.integration_type) {
            return reject(
                self.owner(),
                "integration point",
                "target id and integration type are required",
            );
        }
        let exists = self.integration_points.iter().any(|existing| {
            existing.target_id == point.target_id
                && existing.integration_type == point.integration_type
        });
        if exists {
            return Mutation::unchanged();
        }

        let event = self.owner().event(
            Relation::IntegrationPoint,
            RelationChange::Added,
            &point.target_id,
            Some(&point.integration_type),
        );
        self.integration_points.push(point);
        Mutation::applied(event)
    }

    /// Remove every integration point aimed at `target_id`
    pub fn remove_integration_point(&mut self, target_id: &str) -> Mutation {
        let before = self.integration_points.len();
        self.integration_points
            .retain(|point| point.target_id != target_id);
        if self.integration_points.len() == before {
            return Mutation::unchanged();
        }
        Mutation::applied(self.owner().event(
            Relation::IntegrationPoint,
            RelationChange::Removed,
            target_id,
            None,
        ))
    }

    /// Add a parameter; `name` and `type` are required, names are unique
    pub fn add_parameter(&mut self, parameter: Parameter) -> Mutation {
        if is_blank(&parameter.name) || is_blank(&parameter.param_type) {
            return reject(self.owner(), "parameter", "name and type are required");
        }
        let owner = Owner::new(NodeType::Function, &self.base.id);
        let kind = parameter.param_type.clone();
        add_keyed(
            &mut self.parameters,
            owner,
            Relation::Parameter,
            parameter,
            Some(&kind),
        )
    }

    pub fn remove_parameter(&mut self, name: &str) -> Mutation {
        let owner = Owner::new(NodeType::Function, &self.base.id);
        remove_keyed(&mut self.parameters, owner, Relation::Parameter, name)
    }

    pub fn set_signature(&mut self, signature: Option<String>) -> Mutation {
        self.function_signature = signature;
        self.field_changed("signature", json!(self.function_signature))
    }

    pub fn set_return_value(&mut self, return_value: Option<Value>) -> Mutation {
        self.return_value = return_value;
        self.field_changed("returnValue", json!(self.return_value))
    }

    fn field_changed(&self, field: &str, value: Value) -> Mutation {
        Mutation::applied(NodeEvent::FieldChanged {
            scope: Some(NodeType::Function),
            node_id: self.base.id.clone(),
            field: field.to_string(),
            value,
        })
    }

    /// min(30, parameters x 5) + 10 if it returns a value
    /// + min(40, integration points x 8) + min(20, specifications x 10)
    pub fn complexity_score(&self) -> u32 {
        let returns = if self.return_value.is_some() { 10 } else { 0 };
        clamp_score(
            weighted(self.parameters.len(), 5, 30)
                + returns
                + weighted(self.integration_points.len(), 8, 40)
                + weighted(self.specifications.len(), 10, 20),
        )
    }

    pub fn function_visual_properties(
        &self,
        provider: Option<&dyn VisualPropertiesProvider>,
        role: &str,
    ) -> Map<String, Value> {
        let mut properties = self.visual_properties(provider, role);
        properties.insert("parameterCount".to_string(), json!(self.parameters.len()));
        properties.insert(
            "integrationPointCount".to_string(),
            json!(self.integration_points.len()),
        );
        properties.insert(
            "specificationCount".to_string(),
            json!(self.specifications.len()),
        );
        properties.insert(
            "hasReturnValue".to_string(),
            json!(self.return_value.is_some()),
        );
        properties.insert("complexity".to_string(), json!(self.complexity_score()));
        properties
    }
}

impl NodeBehavior for FunctionNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn node_type(&self) -> NodeType {
        NodeType::Function
    }

    fn detail_fields(&self) -> &'static [&'static str] {
        DETAIL_FIELDS
    }

    fn accepts_type(node_type: NodeType) -> bool {
        node_type == NodeType::Function
    }
}
