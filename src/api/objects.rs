/// Signed object download endpoint
///
/// Serves objects from the filesystem store to holders of a valid signed URL.
/// The URL is bound to one key, one method and an expiry instant.

use crate::storage::{FsObjectStore, SignedQuery, StoreError};
use axum::{
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;

/// State for the object routes
#[derive(Clone)]
pub struct ObjectsState {
    pub store: Arc<FsObjectStore>,
}

/// Create object download routes
pub fn create_object_routes() -> Router<ObjectsState> {
    Router::new().route("/objects/{*key}", get(get_object))
}

/// Download a stored object
///
/// GET /objects/{key}?X-Miivvy-Algorithm=...&X-Miivvy-Version=...&X-Miivvy-Method=GET&X-Miivvy-Expires=...&X-Miivvy-Signature=...
async fn get_object(
    State(state): State<ObjectsState>,
    method: Method,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Response {
    // HEAD is answered like GET
    let method = if method == Method::HEAD { Method::GET } else { method };

    if let Err(e) = state.store.verify(&key, &method, &query, chrono::Utc::now()) {
        tracing::warn!("🚫 Rejected object request for {}: {}", key, e);
        return error_response(&e);
    }

    match state.store.get_object(&key).await {
        Ok((bytes, metadata)) => {
            tracing::info!("📤 Serving object {} ({} bytes)", key, metadata.size);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, metadata.content_type),
                    (header::ETAG, format!("\"{}\"", metadata.sha256)),
                    (header::CACHE_CONTROL, "private, no-store".to_string()),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!("❌ Failed to read object {}: {}", key, e);
            error_response(&e)
        }
    }
}

fn error_response(error: &StoreError) -> Response {
    let status = match error {
        StoreError::SignatureRejected(_) => StatusCode::FORBIDDEN,
        StoreError::NotFound(_) | StoreError::InvalidKey(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
