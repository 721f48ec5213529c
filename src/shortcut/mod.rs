/// Shortcut Document Layer
///
/// Builds and encodes the automation document delivered to users:
/// - Typed document model (actions, payload fields, metadata)
/// - Pure builder for the LINE "app opened" automation
/// - Deterministic XML property-list serializer

// Document model
pub mod types;

// Pure document builder and document constants
pub mod builder;

// Property-list encoder
pub mod serializer;

// Re-export commonly used items
pub use builder::build_document;
pub use serializer::{serialize, SHORTCUT_CONTENT_TYPE, SHORTCUT_EXTENSION};
pub use types::{ActionKind, ActionStep, WorkflowDocument};
