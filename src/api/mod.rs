/// HTTP API Layer
///
/// This module provides the REST endpoints of the shortcut service:
/// - Shortcut generation and delivery (download, base64, signed URL, catalog info)
/// - App usage event webhook that generated shortcuts call
/// - Signed object downloads backed by the filesystem store

// Shortcut generation and delivery endpoints
pub mod shortcuts;

// Usage event webhook endpoint
pub mod webhooks;

// Signed object download endpoint
pub mod objects;

// Re-export router builders
pub use objects::{create_object_routes, ObjectsState};
pub use shortcuts::{create_shortcut_routes, AppState};
pub use webhooks::create_webhook_routes;
