//! Specification nodes (level 5)

use crate::behaviors::NodeBehavior;
use crate::events::{Mutation, NodeEvent, Relation};
use crate::models::relations::{
    add_keyed, add_reference, is_blank, reject, remove_keyed, remove_reference, Keyed, Owner,
};
use crate::models::{NodeBase, NodeType};
use crate::visualization::{blob_size, clamp_score, weighted, VisualPropertiesProvider};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

const DETAIL_FIELDS: &[&str] = &["requirements", "standards", "implementation_details"];

/// Requirement priority, `medium` unless stated
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
}

impl Requirement {
    pub fn new(id: impl Into<String>, description: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            priority,
        }
    }
}

impl Keyed for Requirement {
    fn key(&self) -> &str {
        &self.id
    }
}

/// External standard a specification conforms to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standard {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Standard {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl Keyed for Standard {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationNode {
    #[serde(flatten)]
    pub base: NodeBase,

    #[serde(default)]
    integrations: Vec<String>,

    #[serde(default)]
    requirements: Vec<Requirement>,

    #[serde(default)]
    standards: Vec<Standard>,

    /// Freeform details, usually Markdown text
    #[serde(default, skip_serializing_if = "Value::is_null")]
    implementation_details: Value,
}

impl SpecificationNode {
    pub fn new(base: NodeBase) -> Self {
        Self {
            base,
            integrations: Vec::new(),
            requirements: Vec::new(),
            standards: Vec::new(),
            implementation_details: Value::Null,
        }
    }

    fn owner(&self) -> Owner<'_> {
        Owner::new(NodeType::Specification, &self.base.id)
    }

    pub fn integrations(&self) -> &[String] {
        &self.integrations
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn standards(&self) -> &[Standard] {
        &self.standards
    }

    pub fn implementation_details(&self) -> &Value {
        &self.implementation_details
    }

    pub fn add_integration(&mut self, integration_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Specification, &self.base.id);
        add_reference(
            &mut self.integrations,
            owner,
            Relation::Integration,
            integration_id,
        )
    }

    pub fn remove_integration(&mut self, integration_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Specification, &self.base.id);
        remove_reference(
            &mut self.integrations,
            owner,
            Relation::Integration,
            integration_id,
        )
    }

    /// Add a requirement; `id` and `description` are required
    pub fn add_requirement(&mut self, requirement: Requirement) -> Mutation {
        if is_blank(&requirement.id) || is_blank(&requirement.description) {
            return reject(self.owner(), "requirement", "id and description are required");
        }
        let owner = Owner::new(NodeType::Specification, &self.base.id);
        add_keyed(
            &mut self.requirements,
            owner,
            Relation::Requirement,
            requirement,
            None,
        )
    }

    pub fn remove_requirement(&mut self, requirement_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Specification, &self.base.id);
        remove_keyed(
            &mut self.requirements,
            owner,
            Relation::Requirement,
            requirement_id,
        )
    }

    /// Add a standard; `id` and `name` are required
    pub fn add_standard(&mut self, standard: Standard) -> Mutation {
        if is_blank(&standard.id) || is_blank(&standard.name) {
            return reject(self.owner(), "standard", "id and name are required");
        }
        let owner = Owner::new(NodeType::Specification, &self.base.id);
        add_keyed(&mut self.standards, owner, Relation::Standard, standard, None)
    }

    pub fn remove_standard(&mut self, standard_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Specification, &self.base.id);
        remove_keyed(&mut self.standards, owner, Relation::Standard, standard_id)
    }

    pub fn set_implementation_details(&mut self, details: Value) -> Mutation {
        self.implementation_details = details;
        Mutation::applied(NodeEvent::FieldChanged {
            scope: Some(NodeType::Specification),
            node_id: self.base.id.clone(),
            field: "implementationDetails".to_string(),
            value: self.implementation_details.clone(),
        })
    }

    /// Number of requirements per priority, every priority present
    pub fn requirement_priority_breakdown(&self) -> BTreeMap<Priority, usize> {
        let mut breakdown: BTreeMap<Priority, usize> = [
            Priority::Low,
            Priority::Medium,
            Priority::High,
            Priority::Critical,
        ]
        .into_iter()
        .map(|priority| (priority, 0))
        .collect();
        for requirement in &self.requirements {
            *breakdown.entry(requirement.priority).or_default() += 1;
        }
        breakdown
    }

    /// min(40, requirements x 8) + min(30, standards x 10)
    /// + min(20, integrations x 10) + min(10, detail bytes / 50)
    pub fn completeness_score(&self) -> u32 {
        clamp_score(
            weighted(self.requirements.len(), 8, 40)
                + weighted(self.standards.len(), 10, 30)
                + weighted(self.integrations.len(), 10, 20)
                + weighted(blob_size(&self.implementation_details) / 50, 1, 10),
        )
    }

    pub fn specification_visual_properties(
        &self,
        provider: Option<&dyn VisualPropertiesProvider>,
        role: &str,
    ) -> Map<String, Value> {
        let mut properties = self.visual_properties(provider, role);
        let breakdown: Map<String, Value> = self
            .requirement_priority_breakdown()
            .into_iter()
            .map(|(priority, count)| (priority.as_str().to_string(), json!(count)))
            .collect();

        properties.insert(
            "requirementCount".to_string(),
            json!(self.requirements.len()),
        );
        properties.insert("standardCount".to_string(), json!(self.standards.len()));
        properties.insert(
            "integrationCount".to_string(),
            json!(self.integrations.len()),
        );
        properties.insert("priorityBreakdown".to_string(), Value::Object(breakdown));
        properties.insert(
            "completeness".to_string(),
            json!(self.completeness_score()),
        );
        properties
    }
}

impl NodeBehavior for SpecificationNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn node_type(&self) -> NodeType {
        NodeType::Specification
    }

    fn detail_fields(&self) -> &'static [&'static str] {
        DETAIL_FIELDS
    }

    fn accepts_type(node_type: NodeType) -> bool {
        node_type == NodeType::Specification
    }
}
