/// App usage event webhook
///
/// Receives the callback issued by generated shortcuts. Events are validated,
/// stamped with a server timestamp when the shortcut did not resolve one, and
/// logged. Persistence belongs to the log service and is not done here.

use axum::{http::StatusCode, response::Json, routing::post, Router};
use serde::Deserialize;
use serde_json::{json, Value};

/// Fields an event must carry, as reported back to clients
const REQUIRED_EVENT_FIELDS: [&str; 3] = ["user_id", "app_name", "event_type"];

/// Usage event sent by a shortcut or another client
///
/// Shortcuts identify the app by `app_id`; other clients send `app_name`. Either is accepted.
#[derive(Debug, Deserialize)]
pub struct AppEvent {
    pub user_id: Option<String>,
    pub app_name: Option<String>,
    pub app_id: Option<String>,
    pub event_type: Option<String>,
    pub timestamp: Option<String>,
}

/// Create webhook routes
pub fn create_webhook_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/webhook", post(receive_event))
}

/// Receive an app usage event
///
/// POST /api/webhook
/// Body: { "user_id": "...", "app_name" | "app_id": "...", "event_type": "app_opened", "timestamp": "ISO8601" }
/// Returns: 201 { "status": "success", "message": "Event received", "event_id": null, "timestamp": "..." }
async fn receive_event(body: String) -> (StatusCode, Json<Value>) {
    tracing::debug!("📄 Webhook body: {}", body);

    // Parse JSON body manually so malformed payloads get the same error shape
    let event: AppEvent = match serde_json::from_str(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("❌ Invalid JSON payload for webhook: {}", e);
            return missing_fields();
        }
    };

    let present = |value: &Option<String>| value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(String::from);
    let user_id = present(&event.user_id);
    let app = present(&event.app_name).or_else(|| present(&event.app_id));
    let event_type = present(&event.event_type);

    let (Some(user_id), Some(app), Some(event_type)) = (user_id, app, event_type) else {
        tracing::warn!("❌ Webhook event missing required fields");
        return missing_fields();
    };

    let timestamp = resolve_timestamp(event.timestamp.as_deref());

    tracing::info!("📥 App event received: user={} app={} event={} at {}", user_id, app, event_type, timestamp);

    (
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Event received",
            "event_id": null,
            "timestamp": timestamp,
        })),
    )
}

/// Use the client timestamp when it is a real value, otherwise the server clock
///
/// A shortcut whose date variable did not resolve sends an empty string or the
/// bare placeholder text.
fn resolve_timestamp(timestamp: Option<&str>) -> String {
    match timestamp.map(str::trim) {
        Some(ts) if !ts.is_empty() && ts != "\u{FFFC}" && !ts.starts_with("{{") => ts.to_string(),
        _ => chrono::Utc::now().to_rfc3339(),
    }
}

fn missing_fields() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "Missing required fields",
            "required": REQUIRED_EVENT_FIELDS,
        })),
    )
}
