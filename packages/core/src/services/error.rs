//! Service Layer Error Types
//!
//! Errors for node collection management and hierarchy loading.

use crate::models::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Service operation errors
#[derive(Error, Debug)]
pub enum NodeServiceError {
    /// Node not found by ID
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// A node with this ID is already held
    #[error("Duplicate node ID: {id}")]
    DuplicateNode { id: String },

    /// Validation failed for node
    #[error("Node validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Hierarchy data could not be read
    #[error("Failed to read {}: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },
}

impl NodeServiceError {
    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create a duplicate node error
    pub fn duplicate_node(id: impl Into<String>) -> Self {
        Self::DuplicateNode { id: id.into() }
    }

    /// Create a source unavailable error
    pub fn source_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
