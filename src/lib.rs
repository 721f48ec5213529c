/// Miivvy shortcut service: generates iOS Shortcuts that report app usage
///
/// This library builds the LINE "app opened" automation document, encodes it as
/// a property list, and delivers it as a download, a base64 payload, or a
/// signed object-store URL.

// Core configuration and setup
pub mod config;

// Error taxonomy and HTTP mapping
pub mod error;

// Target-app catalog - supported apps and setup instructions
pub mod catalog;

// Shortcut document layer - typed model, builder and property-list serializer
pub mod shortcut;

// Object store gateway - durable puts and signed URLs
pub mod storage;

// Delivery channels - direct download, inline base64, signed reference
pub mod delivery;

// HTTP API layer - shortcut, webhook and object endpoints
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use catalog::{CatalogRegistry, TargetApp};
pub use error::ShortcutError;
pub use server::{build_router, create_app, start_server};
pub use shortcut::{build_document, serialize, WorkflowDocument};
