/// Delivery Layer
///
/// Hands serialized shortcuts to clients as a direct download, an inline
/// base64 payload, or a signed object-store URL.

// Channel implementations and artifact naming
pub mod dispatcher;

// Re-export commonly used types
pub use dispatcher::{
    artifact_stem, download_filename, object_key, DeliveryArtifact, DeliveryDispatcher,
    InlineArtifact, SignedReference, validate_user_id, SIGNED_URL_TTL_DAYS,
};
