/// App Catalog Layer
///
/// Static registry of supported target apps, their display metadata and the
/// setup instructions shown to users.

// Immutable catalog registry and entry type
pub mod registry;

// Re-export commonly used types
pub use registry::{CatalogRegistry, TargetApp, LINE_APP_ID};
