/// Shortcut generation REST API endpoints
///
/// Every route validates the app id against the catalog, builds and serializes
/// a fresh document, and hands the bytes to one delivery channel. Nothing is
/// cached between requests.

use crate::{
    catalog::{CatalogRegistry, TargetApp},
    config::ShortcutConfig,
    delivery::{
        artifact_stem, validate_user_id, DeliveryArtifact, DeliveryDispatcher, InlineArtifact,
        SIGNED_URL_TTL_DAYS,
    },
    error::ShortcutError,
    shortcut::{build_document, serialize, SHORTCUT_EXTENSION},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Application state shared by the shortcut routes
#[derive(Clone)]
pub struct AppState {
    /// Read-only target-app catalog
    pub catalog: Arc<CatalogRegistry>,
    /// Delivery channels, including the object store for signed URLs
    pub dispatcher: DeliveryDispatcher,
    /// Shortcut settings (default webhook base URL)
    pub shortcuts: Arc<ShortcutConfig>,
}

/// Request body for shortcut generation
#[derive(Debug, Default, Deserialize)]
pub struct GenerateShortcutRequest {
    pub app_id: Option<String>,
    pub user_id: Option<String>,
    pub webhook_url: Option<String>,
}

impl GenerateShortcutRequest {
    /// Return `(app_id, user_id, webhook_url)`, or every field that is absent or empty
    ///
    /// Whitespace-only values are reported as missing; the builder would refuse them anyway.
    fn required_fields(&self) -> Result<(&str, &str, &str), ShortcutError> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.trim().is_empty())
        }

        match (present(&self.app_id), present(&self.user_id), present(&self.webhook_url)) {
            (Some(app_id), Some(user_id), Some(webhook_url)) => Ok((app_id, user_id, webhook_url)),
            (app_id, user_id, webhook_url) => {
                let missing = [("app_id", app_id), ("user_id", user_id), ("webhook_url", webhook_url)]
                    .into_iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(name, _)| name)
                    .collect();
                Err(ShortcutError::MissingFields(missing))
            }
        }
    }
}

/// Response for the signed-URL channel
#[derive(Debug, Serialize)]
pub struct SignedUrlResponse {
    pub url: String,
    pub name: String,
    pub expires_in_days: i64,
    pub expires_at: DateTime<Utc>,
}

/// Create shortcut routes
///
/// Paths are relative; the server nests them under `/api`.
pub fn create_shortcut_routes() -> Router<AppState> {
    Router::new()
        .route("/shortcuts/generate", post(generate_shortcut))
        .route("/shortcuts/download/{app_id}/{user_id}", get(download_shortcut))
        .route("/shortcuts/base64/{app_id}/{user_id}", get(shortcut_base64))
        .route("/shortcuts/url/{app_id}/{user_id}", get(shortcut_signed_url))
        .route("/shortcuts/info/{app_id}", get(shortcut_info))
}

/// Generate a shortcut for an explicit webhook URL
///
/// POST /api/shortcuts/generate
/// Body: { "app_id": "line", "user_id": "user_123", "webhook_url": "https://example.com/api/webhook" }
/// Returns: .shortcut attachment
async fn generate_shortcut(
    State(state): State<AppState>,
    payload: Result<Json<GenerateShortcutRequest>, JsonRejection>,
) -> Result<Response, ShortcutError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!("❌ Rejected shortcut request body: {}", rejection.body_text());
        ShortcutError::InvalidBody(rejection.body_text())
    })?;

    let (app_id, user_id, webhook_url) = request.required_fields()?;
    let app = state.catalog.require_supported(app_id)?;
    validate_user_id(user_id)?;

    tracing::info!("🛠️ Generating {} shortcut for user {}", app.app_id, user_id);
    let bytes = render_shortcut(user_id, webhook_url)?;

    let artifact = DeliveryArtifact::new(bytes, &app.app_id, user_id, Utc::now().date_naive());
    Ok(state.dispatcher.direct(artifact))
}

/// Download a shortcut pointing at this service's webhook
///
/// GET /api/shortcuts/download/{app_id}/{user_id}
/// Returns: .shortcut attachment (opened from Safari)
async fn download_shortcut(
    State(state): State<AppState>,
    Path((app_id, user_id)): Path<(String, String)>,
) -> Result<Response, ShortcutError> {
    let (app, bytes) = default_shortcut(&state, &app_id, &user_id)?;

    let artifact = DeliveryArtifact::new(bytes, &app.app_id, &user_id, Utc::now().date_naive());
    Ok(state.dispatcher.direct(artifact))
}

/// Shortcut as base64 inside JSON
///
/// GET /api/shortcuts/base64/{app_id}/{user_id}
/// Returns: { "data": "<base64>", "name": "Miivvy_LINE_{user_id}" }
async fn shortcut_base64(
    State(state): State<AppState>,
    Path((app_id, user_id)): Path<(String, String)>,
) -> Result<Json<InlineArtifact>, ShortcutError> {
    let (app, bytes) = default_shortcut(&state, &app_id, &user_id)?;

    Ok(Json(state.dispatcher.inline_base64(&bytes, &app.app_id, &user_id)))
}

/// Shortcut uploaded to the object store, returned as a signed URL
///
/// GET /api/shortcuts/url/{app_id}/{user_id}
/// Returns: { "url": "...", "name": "Miivvy_LINE_{user_id}.shortcut", "expires_in_days": 7, "expires_at": "..." }
async fn shortcut_signed_url(
    State(state): State<AppState>,
    Path((app_id, user_id)): Path<(String, String)>,
) -> Result<Json<SignedUrlResponse>, ShortcutError> {
    let (app, bytes) = default_shortcut(&state, &app_id, &user_id)?;

    let reference = state
        .dispatcher
        .signed_reference(bytes, &user_id, &app.app_id)
        .await?;

    Ok(Json(SignedUrlResponse {
        url: reference.url,
        name: format!("{}.{}", artifact_stem(&app.app_id, &user_id), SHORTCUT_EXTENSION),
        expires_in_days: SIGNED_URL_TTL_DAYS,
        expires_at: reference.expires_at,
    }))
}

/// Catalog entry with setup instructions
///
/// GET /api/shortcuts/info/{app_id}
/// Returns: { "app_id": "line", "app_name": "LINE", "bundle_id": "...", "supported": true, "instructions": [...] }
async fn shortcut_info(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<Json<TargetApp>, ShortcutError> {
    let app = state.catalog.lookup(&app_id)?;
    Ok(Json(app.clone()))
}

/// Validate the app and render a shortcut for the configured webhook URL
fn default_shortcut<'a>(
    state: &'a AppState,
    app_id: &str,
    user_id: &str,
) -> Result<(&'a TargetApp, Vec<u8>), ShortcutError> {
    let app = state.catalog.require_supported(app_id)?;
    validate_user_id(user_id)?;
    let webhook_url = state.shortcuts.default_webhook_url();

    tracing::info!("🛠️ Generating {} shortcut for user {} -> {}", app.app_id, user_id, webhook_url);
    let bytes = render_shortcut(user_id, &webhook_url)?;
    Ok((app, bytes))
}

fn render_shortcut(user_id: &str, webhook_url: &str) -> Result<Vec<u8>, ShortcutError> {
    let document = build_document(user_id, webhook_url)?;
    let bytes = serialize(&document)?;
    tracing::debug!("📄 Serialized shortcut: {} bytes", bytes.len());
    Ok(bytes)
}
