//! Integration nodes (level 6)

use crate::behaviors::NodeBehavior;
use crate::events::{Mutation, NodeEvent, Relation};
use crate::models::relations::{
    add_keyed, add_reference, is_blank, reject, remove_keyed, remove_reference, Keyed, Owner,
};
use crate::models::{NodeBase, NodeType};
use crate::visualization::{blob_size, clamp_score, weighted, VisualPropertiesProvider};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const DETAIL_FIELDS: &[&str] = &["constraints", "dependencies", "integration_approach"];

fn default_constraint_type() -> String {
    "technical".to_string()
}

fn default_impact() -> String {
    "medium".to_string()
}

fn default_dependency_type() -> String {
    "library".to_string()
}

/// Limitation an integration has to respect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: String,
    pub description: String,
    #[serde(rename = "type", default = "default_constraint_type")]
    pub constraint_type: String,
    #[serde(default = "default_impact")]
    pub impact: String,
}

impl Constraint {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            constraint_type: default_constraint_type(),
            impact: default_impact(),
        }
    }
}

impl Keyed for Constraint {
    fn key(&self) -> &str {
        &self.id
    }
}

/// External artifact an integration needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "type", default = "default_dependency_type")]
    pub dependency_type: String,
}

impl Dependency {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: None,
            dependency_type: default_dependency_type(),
        }
    }
}

impl Keyed for Dependency {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationNode {
    #[serde(flatten)]
    pub base: NodeBase,

    #[serde(default)]
    techniques: Vec<String>,

    #[serde(default)]
    constraints: Vec<Constraint>,

    #[serde(default)]
    dependencies: Vec<Dependency>,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    integration_approach: Value,
}

impl IntegrationNode {
    pub fn new(base: NodeBase) -> Self {
        Self {
            base,
            techniques: Vec::new(),
            constraints: Vec::new(),
            dependencies: Vec::new(),
            integration_approach: Value::Null,
        }
    }

    fn owner(&self) -> Owner<'_> {
        Owner::new(NodeType::Integration, &self.base.id)
    }

    pub fn techniques(&self) -> &[String] {
        &self.techniques
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn integration_approach(&self) -> &Value {
        &self.integration_approach
    }

    pub fn add_technique(&mut self, technique_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Integration, &self.base.id);
        add_reference(&mut self.techniques, owner, Relation::Technique, technique_id)
    }

    pub fn remove_technique(&mut self, technique_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Integration, &self.base.id);
        remove_reference(&mut self.techniques, owner, Relation::Technique, technique_id)
    }

    /// Add a constraint; `id` and `description` are required
    pub fn add_constraint(&mut self, constraint: Constraint) -> Mutation {
        if is_blank(&constraint.id) || is_blank(&constraint.description) {
            return reject(self.owner(), "constraint", "id and description are required");
        }
        let owner = Owner::new(NodeType::Integration, &self.base.id);
        let kind = constraint.constraint_type.clone();
        add_keyed(
            &mut self.constraints,
            owner,
            Relation::Constraint,
            constraint,
            Some(&kind),
        )
    }

    pub fn remove_constraint(&mut self, constraint_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Integration, &self.base.id);
        remove_keyed(
            &mut self.constraints,
            owner,
            Relation::Constraint,
            constraint_id,
        )
    }

    /// Add a dependency; `id` and `name` are required
    pub fn add_dependency(&mut self, dependency: Dependency) -> Mutation {
        if is_blank(&dependency.id) || is_blank(&dependency.name) {
            return reject(self.owner(), "dependency", "id and name are required");
        }
        let owner = Owner::new(NodeType::Integration, &self.base.id);
        let kind = dependency.dependency_type.clone();
        add_keyed(
            &mut self.dependencies,
            owner,
            Relation::Dependency,
            dependency,
            Some(&kind),
        )
    }

    pub fn remove_dependency(&mut self, dependency_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Integration, &self.base.id);
        remove_keyed(
            &mut self.dependencies,
            owner,
            Relation::Dependency,
            dependency_id,
        )
    }

    pub fn set_integration_approach(&mut self, approach: Value) -> Mutation {
        self.integration_approach = approach;
        Mutation::applied(NodeEvent::FieldChanged {
            scope: Some(NodeType::Integration),
            node_id: self.base.id.clone(),
            field: "integrationApproach".to_string(),
            value: self.integration_approach.clone(),
        })
    }

    /// min(30, constraints x 6) + min(30, dependencies x 6)
    /// + min(25, techniques x 5) + min(15, approach bytes / 50)
    pub fn complexity_score(&self) -> u32 {
        clamp_score(
            weighted(self.constraints.len(), 6, 30)
                + weighted(self.dependencies.len(), 6, 30)
                + weighted(self.techniques.len(), 5, 25)
                + weighted(blob_size(&self.integration_approach) / 50, 1, 15),
        )
    }

    pub fn integration_visual_properties(
        &self,
        provider: Option<&dyn VisualPropertiesProvider>,
        role: &str,
    ) -> Map<String, Value> {
        let mut properties = self.visual_properties(provider, role);
        properties.insert("techniqueCount".to_string(), json!(self.techniques.len()));
        properties.insert(
            "constraintCount".to_string(),
            json!(self.constraints.len()),
        );
        properties.insert(
            "dependencyCount".to_string(),
            json!(self.dependencies.len()),
        );
        properties.insert("complexity".to_string(), json!(self.complexity_score()));
        properties
    }
}

impl NodeBehavior for IntegrationNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn node_type(&self) -> NodeType {
        NodeType::Integration
    }

    fn detail_fields(&self) -> &'static [&'static str] {
        DETAIL_FIELDS
    }

    fn accepts_type(node_type: NodeType) -> bool {
        node_type == NodeType::Integration
    }
}
