//! Node Behavior System
//!
//! Behavior shared by every typed variant that needs the whole record rather
//! than just the common [`NodeBase`] fields: serialization, reconstruction,
//! versioning and the visual-properties projection.
//!
//! # Architecture
//!
//! Variants implement four accessors (`base`, `base_mut`, `node_type`,
//! `detail_fields`) and inherit everything else. Field-level behavior (UI
//! setters, permissions, encryption) lives on `NodeBase` itself.
//!
//! # Examples
//!
//! ```rust
//! use alignviz_core::behaviors::NodeBehavior;
//! use alignviz_core::models::{FunctionNode, NodeBase};
//!
//! let mut function = FunctionNode::new(NodeBase::with_id("f1", "Score"));
//! let _ = function.create_version("alice", "initial");
//!
//! assert_eq!(function.base().version, 2);
//! assert_eq!(function.to_object(false)["level"], 4);
//! ```

use crate::crypto::UnlockedContent;
use crate::events::{Mutation, NodeEvent};
use crate::models::{NodeBase, NodeType, ValidationError, VersionSnapshot};
use crate::visualization::{fallback_visual_properties, VisualPropertiesProvider};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Serialized keys that only appear in detailed records
const CIPHERTEXT_FIELDS: [&str; 2] = ["encryptedContent", "encryptionMetadata"];

/// Shared behavior for typed node variants
pub trait NodeBehavior: Serialize + DeserializeOwned + Sized {
    /// Common record
    fn base(&self) -> &NodeBase;

    /// Common record (mutable)
    fn base_mut(&mut self) -> &mut NodeBase;

    /// Variant type tag
    fn node_type(&self) -> NodeType;

    /// Serialized keys omitted unless details are requested
    fn detail_fields(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether a record with this type tag may be reconstructed as `Self`
    fn accepts_type(node_type: NodeType) -> bool;

    fn id(&self) -> &str {
        &self.base().id
    }

    /// Fixed level for this node's type
    fn level(&self) -> u8 {
        self.node_type().level()
    }

    /// Identity and version bookkeeping checks
    fn validate(&self) -> Result<(), ValidationError> {
        self.base().validate()
    }

    /// Plain record for persistence or transmission
    ///
    /// Ciphertext fields appear only while the node is encrypted; detail blobs
    /// only when `include_details` is set. Plaintext never appears here.
    fn to_object(&self, include_details: bool) -> Value {
        let mut record = match serde_json::to_value(self) {
            Ok(Value::Object(record)) => record,
            Ok(other) => {
                tracing::error!(
                    "Node {} serialized to a non-object value: {}",
                    self.id(),
                    other
                );
                Map::new()
            }
            Err(e) => {
                tracing::error!("Failed to serialize node {}: {}", self.id(), e);
                Map::new()
            }
        };

        record.insert(
            "type".to_string(),
            Value::String(self.node_type().as_str().to_string()),
        );
        record.insert("level".to_string(), Value::from(self.level()));

        if !include_details {
            for field in self.detail_fields() {
                record.remove(*field);
            }
        }
        if !self.base().is_encrypted {
            for field in CIPHERTEXT_FIELDS {
                record.remove(field);
            }
        }

        Value::Object(record)
    }

    /// [`to_object`](Self::to_object) plus `decryptedContent`
    ///
    /// The plaintext is included only if `unlocked` was produced for this node
    /// and the node is still decrypted in this session.
    fn to_object_with_content(&self, include_details: bool, unlocked: &UnlockedContent) -> Value {
        let mut record = self.to_object(include_details);
        if unlocked.node_id() != self.id() || !self.base().is_decrypted() {
            tracing::warn!(
                "Refusing to serialize plaintext for node {}: not decrypted in this session",
                self.id()
            );
            return record;
        }
        if let Value::Object(map) = &mut record {
            map.insert(
                "decryptedContent".to_string(),
                Value::String(unlocked.expose().to_string()),
            );
        }
        record
    }

    /// Record with ciphertext fields unconditionally removed
    fn to_safe_object(&self) -> Value {
        let mut record = self.to_object(false);
        if let Value::Object(map) = &mut record {
            for field in CIPHERTEXT_FIELDS {
                map.remove(field);
            }
        }
        record
    }

    /// Reconstruct from a plain record
    ///
    /// `level` is ignored; a `type` that does not belong to `Self` is rejected.
    fn from_object(value: Value) -> Result<Self, ValidationError> {
        let declared = match value.get("type") {
            Some(Value::String(tag)) => Some(tag.parse::<NodeType>()?),
            Some(other) => return Err(ValidationError::InvalidNodeType(other.to_string())),
            None => None,
        };
        if let Some(node_type) = declared {
            if !Self::accepts_type(node_type) {
                return Err(ValidationError::InvalidNodeType(node_type.to_string()));
            }
        }

        let node: Self = serde_json::from_value(value)
            .map_err(|e| ValidationError::MalformedRecord(e.to_string()))?;

        let base = node.base();
        if base.id.trim().is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }
        if base.parent.as_deref() == Some(base.id.as_str()) {
            return Err(ValidationError::InvalidParent(
                "Node cannot be its own parent".to_string(),
            ));
        }

        Ok(node)
    }

    /// Snapshot the current state, then bump the version
    fn create_version(&mut self, user_id: &str, comment: &str) -> Mutation {
        let mut state = self.to_object(true);
        if let Value::Object(map) = &mut state {
            map.remove("versionHistory");
        }

        let base = self.base_mut();
        let previous = base.version;
        base.version_history.push(VersionSnapshot {
            version: previous,
            timestamp: Utc::now(),
            user_id: user_id.to_string(),
            comment: comment.to_string(),
            state,
        });
        base.version += 1;
        base.touch(user_id);

        Mutation::applied(NodeEvent::VersionCreated {
            node_id: base.id.clone(),
            version: previous,
            user_id: user_id.to_string(),
            comment: comment.to_string(),
        })
    }

    /// Restore content from the snapshot taken at `version`
    ///
    /// The revert is itself recorded as a new version, so the counter keeps
    /// moving forward. Unknown versions leave the node untouched.
    fn revert_to_version(&mut self, version: u32, user_id: &str) -> Mutation {
        let Some(state) = self
            .base()
            .version_history
            .iter()
            .find(|snapshot| snapshot.version == version)
            .map(|snapshot| snapshot.state.clone())
        else {
            tracing::debug!("Node {} has no version {}", self.id(), version);
            return Mutation::unchanged();
        };

        let mut restored = match Self::from_object(state) {
            Ok(restored) => restored,
            Err(e) => {
                tracing::warn!(
                    "Snapshot {} of node {} cannot be restored: {}",
                    version,
                    self.id(),
                    e
                );
                return Mutation::unchanged();
            }
        };

        let recorded = self.create_version(user_id, &format!("Revert to version {}", version));

        let base = self.base_mut();
        let restored_base = restored.base_mut();
        restored_base.version = base.version;
        restored_base.version_history = std::mem::take(&mut base.version_history);
        restored_base.lock();
        *self = restored;

        recorded.and(Mutation::applied(NodeEvent::VersionReverted {
            node_id: self.id().to_string(),
            version,
            user_id: user_id.to_string(),
        }))
    }

    /// Render hints for `role`, from the provider when it answers
    fn visual_properties(
        &self,
        provider: Option<&dyn VisualPropertiesProvider>,
        role: &str,
    ) -> Map<String, Value> {
        provider
            .and_then(|p| p.node_visual_properties(self.base(), self.node_type(), role))
            .unwrap_or_else(|| fallback_visual_properties(self.base(), self.node_type(), role))
    }
}
