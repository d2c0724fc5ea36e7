//! Node Events
//!
//! This module defines the events produced by node mutators and the channel that
//! carries them to the UI.
//!
//! # Architecture
//!
//! Mutators never publish. Each one returns a [`Mutation`] holding whether the
//! node changed and the events describing the change, in emission order. A
//! dispatcher ([`EventBus::dispatch`] or `NodeService::apply`) owns the actual
//! publish call, which keeps the node model testable without a bus.
//!
//! # Event Names
//!
//! - `node:<field>Changed` - UI flag or scalar field setters
//! - `node:visualPropertiesUpdated`, `node:permissionsUpdated`
//! - `node:encrypted`, `node:versionCreated`, `node:versionReverted`
//! - `<variant>:<relation>Added` / `<variant>:<relation>Removed` - relationship lists

mod bus;

pub use bus::{EventBus, EventHandler, SubscriptionId, WILDCARD};

use crate::models::NodeType;
use serde_json::{json, Map, Value};

/// Relationship lists and detail collections that emit add/remove events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Child,
    Capability,
    ImplementedComponent,
    SensitiveCapability,
    Function,
    ImplementingSubcomponent,
    RequiredCapability,
    Specification,
    IntegrationPoint,
    Parameter,
    Integration,
    Requirement,
    Standard,
    Technique,
    Constraint,
    Dependency,
    SourceConnection,
    TargetConnection,
    ValidationRule,
}

impl Relation {
    /// Name used inside event names (`function:specificationAdded`)
    pub fn event_name(&self) -> &'static str {
        match self {
            Relation::Child => "child",
            Relation::Capability => "capability",
            Relation::ImplementedComponent => "implementation",
            Relation::SensitiveCapability => "sensitiveCapability",
            Relation::Function => "function",
            Relation::ImplementingSubcomponent => "implementingSubcomponent",
            Relation::RequiredCapability => "requiredCapability",
            Relation::Specification => "specification",
            Relation::IntegrationPoint => "integrationPoint",
            Relation::Parameter => "parameter",
            Relation::Integration => "integration",
            Relation::Requirement => "requirement",
            Relation::Standard => "standard",
            Relation::Technique => "technique",
            Relation::Constraint => "constraint",
            Relation::Dependency => "dependency",
            Relation::SourceConnection => "sourceConnection",
            Relation::TargetConnection => "targetConnection",
            Relation::ValidationRule => "validationRule",
        }
    }

    /// Payload key carrying the affected reference
    pub fn id_key(&self) -> &'static str {
        match self {
            Relation::Child => "childId",
            Relation::Capability | Relation::SensitiveCapability => "capabilityId",
            Relation::ImplementedComponent => "componentId",
            Relation::Function => "functionId",
            Relation::ImplementingSubcomponent => "subcomponentId",
            Relation::RequiredCapability => "requiredCapabilityId",
            Relation::Specification => "specificationId",
            Relation::IntegrationPoint | Relation::TargetConnection => "targetId",
            Relation::Parameter => "parameterName",
            Relation::Integration => "integrationId",
            Relation::Requirement => "requirementId",
            Relation::Standard => "standardId",
            Relation::Technique => "techniqueId",
            Relation::Constraint => "constraintId",
            Relation::Dependency => "dependencyId",
            Relation::SourceConnection => "sourceId",
            Relation::ValidationRule => "ruleId",
        }
    }

    /// Payload key for the optional relation kind (connection type, parameter type)
    pub fn kind_key(&self) -> &'static str {
        match self {
            Relation::IntegrationPoint => "integrationType",
            Relation::SourceConnection | Relation::TargetConnection => "connectionType",
            Relation::Parameter => "parameterType",
            _ => "kind",
        }
    }
}

/// Direction of a relationship change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationChange {
    Added,
    Removed,
}

impl RelationChange {
    fn suffix(&self) -> &'static str {
        match self {
            RelationChange::Added => "Added",
            RelationChange::Removed => "Removed",
        }
    }
}

/// Events emitted by node mutators
///
/// `scope` is `None` for base-record changes (`node:` prefix) and the owning
/// variant for variant-specific fields.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// A UI flag or scalar field was set (emitted even if the value is unchanged)
    FieldChanged {
        scope: Option<NodeType>,
        node_id: String,
        field: String,
        value: Value,
    },

    /// Visual properties were shallow-merged
    VisualPropertiesUpdated {
        node_id: String,
        properties: Map<String, Value>,
    },

    /// Permission table was updated; carries the merged actions
    PermissionsUpdated { node_id: String, permissions: Value },

    /// Content was encrypted and stored as ciphertext
    ContentEncrypted { node_id: String },

    /// A version snapshot was recorded; `version` is the pre-increment number
    VersionCreated {
        node_id: String,
        version: u32,
        user_id: String,
        comment: String,
    },

    /// Node content was restored from a snapshot
    VersionReverted {
        node_id: String,
        version: u32,
        user_id: String,
    },

    /// A reference was added to or removed from a relationship list
    RelationChanged {
        owner: NodeType,
        owner_id: String,
        relation: Relation,
        change: RelationChange,
        target_id: String,
        kind: Option<String>,
    },
}

impl NodeEvent {
    /// Event name as seen by subscribers
    pub fn event_name(&self) -> String {
        match self {
            NodeEvent::FieldChanged { scope, field, .. } => {
                let prefix = scope.map(|s| s.event_scope()).unwrap_or("node");
                format!("{}:{}Changed", prefix, field)
            }
            NodeEvent::VisualPropertiesUpdated { .. } => "node:visualPropertiesUpdated".to_string(),
            NodeEvent::PermissionsUpdated { .. } => "node:permissionsUpdated".to_string(),
            NodeEvent::ContentEncrypted { .. } => "node:encrypted".to_string(),
            NodeEvent::VersionCreated { .. } => "node:versionCreated".to_string(),
            NodeEvent::VersionReverted { .. } => "node:versionReverted".to_string(),
            NodeEvent::RelationChanged {
                owner,
                relation,
                change,
                ..
            } => format!(
                "{}:{}{}",
                owner.event_scope(),
                relation.event_name(),
                change.suffix()
            ),
        }
    }

    /// ID of the node that produced the event
    pub fn node_id(&self) -> &str {
        match self {
            NodeEvent::FieldChanged { node_id, .. }
            | NodeEvent::VisualPropertiesUpdated { node_id, .. }
            | NodeEvent::PermissionsUpdated { node_id, .. }
            | NodeEvent::ContentEncrypted { node_id }
            | NodeEvent::VersionCreated { node_id, .. }
            | NodeEvent::VersionReverted { node_id, .. } => node_id,
            NodeEvent::RelationChanged { owner_id, .. } => owner_id,
        }
    }

    /// JSON payload delivered with the event (camelCase keys)
    pub fn payload(&self) -> Value {
        match self {
            NodeEvent::FieldChanged {
                node_id,
                field,
                value,
                ..
            } => json!({ "nodeId": node_id, "field": field, "value": value }),
            NodeEvent::VisualPropertiesUpdated {
                node_id,
                properties,
            } => json!({ "nodeId": node_id, "visualProperties": properties }),
            NodeEvent::PermissionsUpdated {
                node_id,
                permissions,
            } => json!({ "nodeId": node_id, "permissions": permissions }),
            NodeEvent::ContentEncrypted { node_id } => json!({ "nodeId": node_id }),
            NodeEvent::VersionCreated {
                node_id,
                version,
                user_id,
                comment,
            } => json!({
                "nodeId": node_id,
                "version": version,
                "userId": user_id,
                "comment": comment
            }),
            NodeEvent::VersionReverted {
                node_id,
                version,
                user_id,
            } => json!({ "nodeId": node_id, "version": version, "userId": user_id }),
            NodeEvent::RelationChanged {
                owner,
                owner_id,
                relation,
                target_id,
                kind,
                ..
            } => {
                let mut payload = Map::new();
                payload.insert(
                    format!("{}Id", owner.event_scope()),
                    Value::String(owner_id.clone()),
                );
                payload.insert(
                    relation.id_key().to_string(),
                    Value::String(target_id.clone()),
                );
                if let Some(kind) = kind {
                    payload.insert(relation.kind_key().to_string(), Value::String(kind.clone()));
                }
                Value::Object(payload)
            }
        }
    }
}

/// Result of a node mutator: whether state changed plus the events to publish
///
/// `applied` is `false` both for rejected input and for idempotent no-ops
/// (adding a reference that already exists). Neither case carries events.
#[must_use = "a mutation carries events that must be dispatched"]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mutation {
    applied: bool,
    events: Vec<NodeEvent>,
}

impl Mutation {
    /// A change that produced a single event
    pub fn applied(event: NodeEvent) -> Self {
        Self {
            applied: true,
            events: vec![event],
        }
    }

    /// Nothing changed and nothing to publish
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Append another mutation's events; the result is applied if either was
    pub fn and(mut self, other: Mutation) -> Self {
        self.applied |= other.applied;
        self.events.extend(other.events);
        self
    }

    /// Whether the node's state changed
    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// Events in emission order
    pub fn events(&self) -> &[NodeEvent] {
        &self.events
    }

    /// Take ownership of the events
    pub fn into_events(self) -> Vec<NodeEvent> {
        self.events
    }
}

#[cfg(test)]
mod events_test;
