//! HTTP error responses
//!
//! Every failure leaves the server as `{message, code, details?}` with a
//! status derived from `code`.

use alignviz_core::NodeServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn node_not_found(node_id: &str) -> Self {
        Self::with_details(
            "Node not found",
            "NODE_NOT_FOUND",
            format!("No node with id '{}'", node_id),
        )
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "NODE_NOT_FOUND" | "RESOURCE_NOT_FOUND" => StatusCode::NOT_FOUND,
            "INVALID_INPUT" | "VALIDATION_ERROR" | "DUPLICATE_NODE" => StatusCode::BAD_REQUEST,
            "SOURCE_UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{} ({}): {:?}", self.message, self.code, self.details);
        }
        (status, Json(self)).into_response()
    }
}

impl From<NodeServiceError> for HttpError {
    fn from(err: NodeServiceError) -> Self {
        match &err {
            NodeServiceError::NodeNotFound { id } => HttpError::node_not_found(id),
            NodeServiceError::DuplicateNode { .. } => {
                HttpError::new(err.to_string(), "DUPLICATE_NODE")
            }
            NodeServiceError::ValidationFailed(inner) => {
                HttpError::with_details(err.to_string(), "VALIDATION_ERROR", format!("{:?}", inner))
            }
            NodeServiceError::SourceUnavailable { .. } => {
                HttpError::new(err.to_string(), "SOURCE_UNAVAILABLE")
            }
        }
    }
}
