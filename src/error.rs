/// Service error taxonomy and its HTTP mapping
///
/// Validation failures (including object keys the store refuses) map to 400,
/// unknown catalog entries to 404, other object store failures and encoder
/// defects to 500. Bodies follow the `{"error": ..., ...}`
/// shape clients already parse.

use crate::storage::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

/// Fields every generate request must carry, in the order they are reported
pub const REQUIRED_GENERATE_FIELDS: [&str; 3] = ["app_id", "user_id", "webhook_url"];

#[derive(Debug, thiserror::Error)]
pub enum ShortcutError {
    /// Request body absent or not valid JSON
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// Required request fields that were absent or empty
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A builder input was empty
    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// User id cannot name a download or an object-store path segment
    #[error("invalid user_id: {0}")]
    InvalidUserId(String),

    /// App id is unknown or not supported for shortcut generation
    #[error("unsupported app '{app_id}'")]
    UnsupportedApp {
        app_id: String,
        supported: Vec<String>,
    },

    /// App id has no catalog entry
    #[error("app '{app_id}' not found")]
    AppNotFound {
        app_id: String,
        supported: Vec<String>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The property-list encoder rejected the document
    #[error("failed to serialize shortcut: {0}")]
    Serialization(#[from] plist::Error),
}

impl IntoResponse for ShortcutError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ShortcutError::InvalidBody(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Request body is required", "message": message }),
            ),
            ShortcutError::MissingFields(missing) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Missing required fields",
                    "required": REQUIRED_GENERATE_FIELDS,
                    "missing": missing,
                }),
            ),
            ShortcutError::EmptyField(field) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Missing required fields", "missing": [field] }),
            ),
            ShortcutError::InvalidUserId(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid user_id", "message": message }),
            ),
            ShortcutError::Store(e @ StoreError::InvalidKey(_)) => {
                tracing::warn!("❌ Object key rejected: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "Invalid user_id", "message": e.to_string() }),
                )
            }
            ShortcutError::UnsupportedApp { supported, .. } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Unsupported app",
                    "message": "Currently only LINE is supported",
                    "supported_apps": supported,
                }),
            ),
            ShortcutError::AppNotFound { supported, .. } => (
                StatusCode::NOT_FOUND,
                json!({ "error": "App not found", "supported_apps": supported }),
            ),
            ShortcutError::Store(e) => {
                tracing::error!("❌ Object store failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Failed to create signed URL", "message": e.to_string() }),
                )
            }
            ShortcutError::Serialization(e) => {
                tracing::error!("❌ Shortcut serialization failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Failed to generate shortcut", "message": e.to_string() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
