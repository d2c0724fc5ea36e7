//! Node Data Structures
//!
//! This module defines the common record shared by every node in the alignment
//! hierarchy, plus the type tags that fix each node's level.
//!
//! # Architecture
//!
//! - **Common record**: `NodeBase` holds identity, hierarchy placement, UI flags,
//!   permissions, encrypted payload and version history
//! - **Typed variants**: each variant struct flattens a `NodeBase` and adds its
//!   own relationship lists (see the sibling modules)
//! - **References, not ownership**: `parent` and every relationship list store
//!   bare ids; nothing verifies that the referenced node exists
//!
//! # Examples
//!
//! ```rust
//! use alignviz_core::models::{NodeBase, NodeType};
//!
//! let mut base = NodeBase::with_id("cap-1", "Reward Modeling");
//! let mutation = base.set_expanded(true);
//!
//! assert!(mutation.is_applied());
//! assert_eq!(mutation.events()[0].event_name(), "node:expandedChanged");
//! assert_eq!(NodeType::Capability.level(), 3);
//! ```

use crate::crypto::{ContentCipher, EncryptionMetadata, UnlockedContent};
use crate::events::{Mutation, NodeEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

fn default_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Validation errors for node construction and reconstruction
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid node type: {0}")]
    InvalidNodeType(String),

    #[error("Invalid node ID format: {0}")]
    InvalidId(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),

    #[error("Inconsistent version history: {0}")]
    InvalidVersionHistory(String),

    #[error("Malformed node record: {0}")]
    MalformedRecord(String),
}

/// Type tag identifying a node variant
///
/// The tag fixes the node's level in the hierarchy; levels are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    ComponentGroup,
    Component,
    Subcomponent,
    Capability,
    Function,
    Specification,
    Integration,
    Technique,
    Application,
    Input,
    Output,
}

impl NodeType {
    /// Every node type, root first
    pub const ALL: [NodeType; 11] = [
        NodeType::ComponentGroup,
        NodeType::Component,
        NodeType::Subcomponent,
        NodeType::Capability,
        NodeType::Function,
        NodeType::Specification,
        NodeType::Integration,
        NodeType::Technique,
        NodeType::Application,
        NodeType::Input,
        NodeType::Output,
    ];

    /// Fixed hierarchy depth (0-9)
    pub const fn level(self) -> u8 {
        match self {
            NodeType::ComponentGroup => 0,
            NodeType::Component => 1,
            NodeType::Subcomponent => 2,
            NodeType::Capability => 3,
            NodeType::Function => 4,
            NodeType::Specification => 5,
            NodeType::Integration => 6,
            NodeType::Technique => 7,
            NodeType::Application => 8,
            NodeType::Input | NodeType::Output => 9,
        }
    }

    /// Serialized `type` tag
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::ComponentGroup => "component_group",
            NodeType::Component => "component",
            NodeType::Subcomponent => "subcomponent",
            NodeType::Capability => "capability",
            NodeType::Function => "function",
            NodeType::Specification => "specification",
            NodeType::Integration => "integration",
            NodeType::Technique => "technique",
            NodeType::Application => "application",
            NodeType::Input => "input",
            NodeType::Output => "output",
        }
    }

    /// Prefix used in variant-scoped event names (`componentGroup:childAdded`)
    pub fn event_scope(&self) -> &'static str {
        match self {
            NodeType::ComponentGroup => "componentGroup",
            other => other.as_str(),
        }
    }
}

impl FromStr for NodeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidNodeType(s.to_string()))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission table: action name ("view", "edit", "delete") to allowed roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(BTreeMap<String, BTreeSet<String>>);

impl Default for Permissions {
    fn default() -> Self {
        let mut table = BTreeMap::new();
        table.insert("view".to_string(), roles(&["admin", "editor", "viewer"]));
        table.insert("edit".to_string(), roles(&["admin", "editor"]));
        table.insert("delete".to_string(), roles(&["admin"]));
        Self(table)
    }
}

fn roles(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|r| r.to_string()).collect()
}

impl Permissions {
    /// An empty table (every check fails)
    pub fn none() -> Self {
        Self(BTreeMap::new())
    }

    /// Whether `role` may perform `action`; an absent action denies
    pub fn allows(&self, action: &str, role: &str) -> bool {
        self.0
            .get(action)
            .map(|allowed| allowed.contains(role))
            .unwrap_or(false)
    }

    /// Roles allowed for an action
    pub fn roles_for(&self, action: &str) -> Option<&BTreeSet<String>> {
        self.0.get(action)
    }

    /// Replace the role set of each action present in `partial`
    pub fn merge(&mut self, partial: BTreeMap<String, BTreeSet<String>>) {
        for (action, allowed) in partial {
            self.0.insert(action, allowed);
        }
    }

    /// Builder-style grant of a full role set for one action
    pub fn with_action(mut self, action: &str, allowed: &[&str]) -> Self {
        self.0.insert(action.to_string(), roles(allowed));
        self
    }

    pub fn to_value(&self) -> Value {
        json!(self.0)
    }
}

/// Layout position assigned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A prior full-state snapshot kept for audit and rollback display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    /// Version number the node had when the snapshot was taken
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    #[serde(default)]
    pub comment: String,
    /// Serialized node state (without its own version history)
    pub state: Value,
}

/// Transient per-process state, never serialized
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SessionState {
    pub(crate) is_decrypted: bool,
}

/// Common record shared by every node variant
///
/// # Fields
///
/// - `id`: Caller-assigned, globally unique identifier
/// - `parent`: Id of the parent node (reference only, not ownership)
/// - `expandable` / `has_children`: UI affordances, not structural truth
/// - `is_encrypted` / `encrypted_content` / `encryption_metadata`: opaque ciphertext
/// - `permissions`: action to role table, fail-closed
/// - `version` / `version_history`: starts at 1, history length is `version - 1`
/// - `visible`, `expanded`, `selected`, `hovered`, `highlighted`, `position`: UI state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBase {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default)]
    pub expandable: bool,

    #[serde(default)]
    pub has_children: bool,

    #[serde(rename = "isEncrypted", default)]
    pub is_encrypted: bool,

    #[serde(
        rename = "encryptedContent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub encrypted_content: Option<String>,

    #[serde(
        rename = "encryptionMetadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub encryption_metadata: Option<EncryptionMetadata>,

    #[serde(default)]
    pub permissions: Permissions,

    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(rename = "versionHistory", default)]
    pub version_history: Vec<VersionSnapshot>,

    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,

    #[serde(
        rename = "lastUpdatedBy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated_by: Option<String>,

    #[serde(default = "default_true")]
    pub visible: bool,

    #[serde(default)]
    pub expanded: bool,

    #[serde(default)]
    pub selected: bool,

    #[serde(default)]
    pub hovered: bool,

    #[serde(default)]
    pub highlighted: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    #[serde(rename = "visualProperties", default)]
    pub visual_properties: Map<String, Value>,

    #[serde(skip)]
    pub(crate) session: SessionState,
}

impl NodeBase {
    /// Create a record with an auto-generated UUID
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name)
    }

    /// Create a record with a caller-assigned id and documented defaults
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            parent: None,
            expandable: false,
            has_children: false,
            is_encrypted: false,
            encrypted_content: None,
            encryption_metadata: None,
            permissions: Permissions::default(),
            version: 1,
            version_history: Vec::new(),
            last_updated: None,
            last_updated_by: None,
            visible: true,
            expanded: false,
            selected: false,
            hovered: false,
            highlighted: false,
            position: None,
            metadata: Map::new(),
            visual_properties: Map::new(),
            session: SessionState::default(),
        }
    }

    /// Builder-style description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder-style parent reference
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Validate identity, placement and version bookkeeping
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }

        if self.parent.as_deref() == Some(self.id.as_str()) {
            return Err(ValidationError::InvalidParent(
                "Node cannot be its own parent".to_string(),
            ));
        }

        if self.version == 0 {
            return Err(ValidationError::InvalidVersionHistory(
                "version starts at 1".to_string(),
            ));
        }

        let expected = (self.version - 1) as usize;
        if self.version_history.len() != expected {
            return Err(ValidationError::InvalidVersionHistory(format!(
                "version {} requires {} history entries, found {}",
                self.version,
                expected,
                self.version_history.len()
            )));
        }

        Ok(())
    }

    /// Whether the node has been decrypted in this process
    pub fn is_decrypted(&self) -> bool {
        self.session.is_decrypted
    }

    /// Forget the session decryption state
    pub fn lock(&mut self) {
        self.session.is_decrypted = false;
    }

    fn field_changed(&self, field: &str, value: Value) -> Mutation {
        Mutation::applied(NodeEvent::FieldChanged {
            scope: None,
            node_id: self.id.clone(),
            field: field.to_string(),
            value,
        })
    }

    pub fn set_expanded(&mut self, expanded: bool) -> Mutation {
        self.expanded = expanded;
        self.field_changed("expanded", json!(expanded))
    }

    pub fn set_visible(&mut self, visible: bool) -> Mutation {
        self.visible = visible;
        self.field_changed("visible", json!(visible))
    }

    pub fn set_position(&mut self, position: Option<Position>) -> Mutation {
        self.position = position;
        self.field_changed("position", json!(position))
    }

    pub fn set_selected(&mut self, selected: bool) -> Mutation {
        self.selected = selected;
        self.field_changed("selected", json!(selected))
    }

    pub fn set_hovered(&mut self, hovered: bool) -> Mutation {
        self.hovered = hovered;
        self.field_changed("hovered", json!(hovered))
    }

    pub fn set_highlighted(&mut self, highlighted: bool) -> Mutation {
        self.highlighted = highlighted;
        self.field_changed("highlighted", json!(highlighted))
    }

    /// Shallow-merge into `visual_properties` (last write wins per key)
    pub fn update_visual_properties(&mut self, partial: Map<String, Value>) -> Mutation {
        for (key, value) in &partial {
            self.visual_properties.insert(key.clone(), value.clone());
        }
        Mutation::applied(NodeEvent::VisualPropertiesUpdated {
            node_id: self.id.clone(),
            properties: partial,
        })
    }

    /// Whether `role` may perform `action` on this node (fail-closed)
    pub fn has_permission(&self, action: &str, role: &str) -> bool {
        self.permissions.allows(action, role)
    }

    /// Override the role set of each action in `partial`
    pub fn update_permissions(&mut self, partial: BTreeMap<String, BTreeSet<String>>) -> Mutation {
        self.permissions.merge(partial);
        Mutation::applied(NodeEvent::PermissionsUpdated {
            node_id: self.id.clone(),
            permissions: self.permissions.to_value(),
        })
    }

    /// Encrypt `content` and store it as this node's ciphertext
    ///
    /// Never fails loudly: any cipher error is logged and the node is left
    /// unchanged. A successful call discards any session decryption.
    pub fn encrypt_content(
        &mut self,
        cipher: &dyn ContentCipher,
        content: &str,
        password: &str,
    ) -> Mutation {
        match cipher.encrypt(content, password) {
            Ok(payload) => {
                self.encrypted_content = Some(payload.ciphertext);
                self.encryption_metadata = Some(payload.metadata);
                self.is_encrypted = true;
                self.session.is_decrypted = false;
                Mutation::applied(NodeEvent::ContentEncrypted {
                    node_id: self.id.clone(),
                })
            }
            Err(e) => {
                tracing::error!("Failed to encrypt content for node {}: {}", self.id, e);
                Mutation::unchanged()
            }
        }
    }

    /// Decrypt the stored ciphertext into an unlocked handle
    ///
    /// Returns `None` if the node holds no ciphertext or the password is wrong;
    /// the stored ciphertext is never altered.
    pub fn decrypt_content(
        &mut self,
        cipher: &dyn ContentCipher,
        password: &str,
    ) -> Option<UnlockedContent> {
        let (Some(ciphertext), Some(metadata), true) = (
            self.encrypted_content.as_deref(),
            self.encryption_metadata.as_ref(),
            self.is_encrypted,
        ) else {
            tracing::warn!("Node {} has no encrypted content to decrypt", self.id);
            self.session.is_decrypted = false;
            return None;
        };

        match cipher.decrypt(ciphertext, password, metadata) {
            Ok(plaintext) => {
                self.session.is_decrypted = true;
                Some(UnlockedContent::new(self.id.clone(), plaintext))
            }
            Err(e) => {
                tracing::warn!("Failed to decrypt content for node {}: {}", self.id, e);
                self.session.is_decrypted = false;
                None
            }
        }
    }

    pub(crate) fn touch(&mut self, user_id: &str) {
        self.last_updated = Some(Utc::now());
        self.last_updated_by = Some(user_id.to_string());
    }
}
