/// Object Store Gateway
///
/// Durable object storage used by the signed-URL delivery channel:
/// - `ObjectStore` trait: put an object, then issue a time-limited signed URL for it
/// - Filesystem-backed implementation with HMAC-SHA256 signed URLs

// Filesystem object store with signed URL issuance and verification
pub mod local;

use async_trait::async_trait;
use axum::http::Method;
use chrono::{DateTime, Utc};

pub use local::{FsObjectStore, ObjectMetadata, SignedQuery, OBJECTS_ROUTE_SEGMENT};

/// Errors raised by object store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store was unreachable or rejected the write
    #[error("upload failed: {0}")]
    Upload(String),

    /// The object was stored but no signed URL could be issued
    #[error("signing failed: {0}")]
    Signing(String),

    /// Object key is not a relative `/`-separated path
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    /// No object stored under the key
    #[error("object not found: {0}")]
    NotFound(String),

    /// Signed URL parameters did not verify (bad signature, wrong method, expired)
    #[error("signed URL rejected: {0}")]
    SignatureRejected(String),

    /// Store could not be constructed from configuration
    #[error("store configuration error: {0}")]
    Configuration(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Signed URL scheme version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningVersion {
    V4,
}

impl SigningVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningVersion::V4 => "v4",
        }
    }
}

/// Parameters for a signed URL: scheme version, expiry instant, and the single permitted method
#[derive(Debug, Clone)]
pub struct SignedUrlRequest {
    pub version: SigningVersion,
    pub expiration: DateTime<Utc>,
    pub method: Method,
}

/// Durable object storage with signed URL issuance
///
/// Implementations must be shareable across request handlers. There is no
/// internal retry; callers that need resilience wrap calls in their own policy.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key` with the given content type, replacing any existing object
    async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError>;

    /// Issue a URL granting `request.method` access to `key` until `request.expiration`
    async fn generate_signed_url(&self, key: &str, request: &SignedUrlRequest) -> Result<String, StoreError>;
}
