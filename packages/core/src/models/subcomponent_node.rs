//! Subcomponent nodes (level 2)
//!
//! A subcomponent groups capabilities and records which components it
//! implements. Some of its capabilities may be flagged as sensitive, which
//! together with the security level drives the lock/shield indicator.

use crate::behaviors::NodeBehavior;
use crate::events::{Mutation, NodeEvent, Relation, RelationChange};
use crate::models::relations::{add_reference, remove_reference, Owner};
use crate::models::{NodeBase, NodeType};
use crate::visualization::{clamp_score, weighted, VisualPropertiesProvider};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// How strictly a subcomponent's implementation is protected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    #[default]
    Standard,
    Enhanced,
    Maximum,
}

impl SecurityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityLevel::Standard => "standard",
            SecurityLevel::Enhanced => "enhanced",
            SecurityLevel::Maximum => "maximum",
        }
    }

    fn indicator(&self) -> &'static str {
        match self {
            SecurityLevel::Standard => "none",
            SecurityLevel::Enhanced => "shield",
            SecurityLevel::Maximum => "lock",
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcomponentNode {
    #[serde(flatten)]
    pub base: NodeBase,

    #[serde(default)]
    capabilities: Vec<String>,

    /// Ids of the components this subcomponent implements
    #[serde(default)]
    implements: Vec<String>,

    #[serde(rename = "sensitiveCapabilities", default)]
    sensitive_capabilities: BTreeSet<String>,

    #[serde(rename = "implementationSecurityLevel", default)]
    implementation_security_level: SecurityLevel,
}

impl SubcomponentNode {
    pub fn new(base: NodeBase) -> Self {
        Self {
            base,
            capabilities: Vec::new(),
            implements: Vec::new(),
            sensitive_capabilities: BTreeSet::new(),
            implementation_security_level: SecurityLevel::default(),
        }
    }

    fn owner(&self) -> Owner<'_> {
        Owner::new(NodeType::Subcomponent, &self.base.id)
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn implements(&self) -> &[String] {
        &self.implements
    }

    pub fn sensitive_capabilities(&self) -> &BTreeSet<String> {
        &self.sensitive_capabilities
    }

    pub fn security_level(&self) -> SecurityLevel {
        self.implementation_security_level
    }

    pub fn add_capability(&mut self, capability_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Subcomponent, &self.base.id);
        add_reference(
            &mut self.capabilities,
            owner,
            Relation::Capability,
            capability_id,
        )
    }

    /// Remove a capability; also drops its sensitive flag
    pub fn remove_capability(&mut self, capability_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Subcomponent, &self.base.id);
        let removed = remove_reference(
            &mut self.capabilities,
            owner,
            Relation::Capability,
            capability_id,
        );
        if removed.is_applied() && self.sensitive_capabilities.remove(capability_id) {
            return removed.and(Mutation::applied(self.owner().event(
                Relation::SensitiveCapability,
                RelationChange::Removed,
                capability_id,
                None,
            )));
        }
        removed
    }

    pub fn add_implementation(&mut self, component_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Subcomponent, &self.base.id);
        add_reference(
            &mut self.implements,
            owner,
            Relation::ImplementedComponent,
            component_id,
        )
    }

    pub fn remove_implementation(&mut self, component_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Subcomponent, &self.base.id);
        remove_reference(
            &mut self.implements,
            owner,
            Relation::ImplementedComponent,
            component_id,
        )
    }

    /// Flag one of this subcomponent's capabilities as sensitive
    ///
    /// Capabilities that are not in the list are rejected.
    pub fn mark_capability_sensitive(&mut self, capability_id: &str) -> Mutation {
        if !self.capabilities.iter().any(|c| c == capability_id) {
            tracing::warn!(
                "Cannot mark unknown capability {} as sensitive on subcomponent {}",
                capability_id,
                self.base.id
            );
            return Mutation::unchanged();
        }
        if !self.sensitive_capabilities.insert(capability_id.to_string()) {
            return Mutation::unchanged();
        }
        Mutation::applied(self.owner().event(
            Relation::SensitiveCapability,
            RelationChange::Added,
            capability_id,
            None,
        ))
    }

    pub fn unmark_capability_sensitive(&mut self, capability_id: &str) -> Mutation {
        if !self.sensitive_capabilities.remove(capability_id) {
            return Mutation::unchanged();
        }
        Mutation::applied(self.owner().event(
            Relation::SensitiveCapability,
            RelationChange::Removed,
            capability_id,
            None,
        ))
    }

    pub fn is_capability_sensitive(&self, capability_id: &str) -> bool {
        self.sensitive_capabilities.contains(capability_id)
    }

    pub fn set_security_level(&mut self, level: SecurityLevel) -> Mutation {
        self.implementation_security_level = level;
        Mutation::applied(NodeEvent::FieldChanged {
            scope: Some(NodeType::Subcomponent),
            node_id: self.base.id.clone(),
            field: "securityLevel".to_string(),
            value: json!(level.as_str()),
        })
    }

    /// min(60, capabilities x 10) + min(40, implemented components x 20)
    pub fn complexity_score(&self) -> u32 {
        clamp_score(
            weighted(self.capabilities.len(), 10, 60) + weighted(self.implements.len(), 20, 40),
        )
    }

    pub fn subcomponent_visual_properties(
        &self,
        provider: Option<&dyn VisualPropertiesProvider>,
        role: &str,
    ) -> Map<String, Value> {
        let mut properties = self.visual_properties(provider, role);
        properties.insert("capabilityCount".to_string(), json!(self.capabilities.len()));
        properties.insert("implementsCount".to_string(), json!(self.implements.len()));
        properties.insert(
            "sensitiveCapabilityCount".to_string(),
            json!(self.sensitive_capabilities.len()),
        );
        properties.insert(
            "securityLevel".to_string(),
            json!(self.implementation_security_level.as_str()),
        );
        properties.insert(
            "securityIndicator".to_string(),
            json!(self.implementation_security_level.indicator()),
        );
        properties.insert("complexity".to_string(), json!(self.complexity_score()));
        properties
    }
}

impl NodeBehavior for SubcomponentNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn node_type(&self) -> NodeType {
        NodeType::Subcomponent
    }

    fn accepts_type(node_type: NodeType) -> bool {
        node_type == NodeType::Subcomponent
    }
}
