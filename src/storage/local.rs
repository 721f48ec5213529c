/// Filesystem-backed object store
///
/// Objects live under `{root}/data/{key}` with a JSON metadata sidecar under
/// `{root}/meta/{key}.json`. Signed URLs point at the server's `/objects/{key}`
/// route and carry an HMAC-SHA256 signature over version, method, key and expiry,
/// so the store can verify them when the object is fetched.

use super::{ObjectStore, SignedUrlRequest, SigningVersion, StoreError};
use crate::config::StorageConfig;
use async_trait::async_trait;
use axum::http::Method;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_ALGORITHM: &str = "HMAC-SHA256";

/// Path segment the object-serving route is mounted under
pub const OBJECTS_ROUTE_SEGMENT: &str = "objects";

/// Durable object store on the local filesystem
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    public_url: Url,
    signing_key: Vec<u8>,
}

/// Metadata recorded alongside every stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub content_type: String,
    pub size: u64,
    /// Hex-encoded SHA-256 of the object bytes
    pub sha256: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Query parameters carried by a signed URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedQuery {
    #[serde(rename = "X-Miivvy-Algorithm")]
    pub algorithm: String,
    #[serde(rename = "X-Miivvy-Version")]
    pub version: String,
    #[serde(rename = "X-Miivvy-Method")]
    pub method: String,
    #[serde(rename = "X-Miivvy-Expires")]
    pub expires: i64,
    #[serde(rename = "X-Miivvy-Signature")]
    pub signature: String,
}

impl FsObjectStore {
    /// Build the store from configuration, creating the root directory
    ///
    /// Fails immediately on a missing signing key or an unusable public URL so a
    /// misconfigured deployment never starts serving requests.
    pub fn new(config: &StorageConfig) -> Result<Self, StoreError> {
        let signing_key = config
            .signing_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| StoreError::Configuration("MIIVVY_SIGNING_KEY is not set".to_string()))?;

        let public_url = Url::parse(&config.public_url).map_err(|e| {
            StoreError::Configuration(format!("invalid public URL '{}': {}", config.public_url, e))
        })?;
        if public_url.cannot_be_a_base() {
            return Err(StoreError::Configuration(format!(
                "public URL '{}' cannot carry object paths",
                config.public_url
            )));
        }

        let root = PathBuf::from(&config.root_dir);
        std::fs::create_dir_all(&root).map_err(|e| {
            StoreError::Configuration(format!("failed to create storage root {}: {}", root.display(), e))
        })?;

        tracing::info!("🗄️ Filesystem object store ready at {}", root.display());

        Ok(Self {
            root,
            public_url,
            signing_key: signing_key.as_bytes().to_vec(),
        })
    }

    /// Read an object and its metadata
    pub async fn get_object(&self, key: &str) -> Result<(Vec<u8>, ObjectMetadata), StoreError> {
        let data_path = self.data_path(key)?;
        let bytes = match tokio::fs::read(&data_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let meta_bytes = tokio::fs::read(self.meta_path(key)?).await?;
        let metadata: ObjectMetadata =
            serde_json::from_slice(&meta_bytes).map_err(std::io::Error::from)?;

        Ok((bytes, metadata))
    }

    /// Check signed URL parameters for `key` against the request method and the current time
    pub fn verify(
        &self,
        key: &str,
        method: &Method,
        query: &SignedQuery,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if query.algorithm != SIGNATURE_ALGORITHM {
            return Err(StoreError::SignatureRejected(format!(
                "unsupported algorithm '{}'",
                query.algorithm
            )));
        }
        if query.version != SigningVersion::V4.as_str() {
            return Err(StoreError::SignatureRejected(format!(
                "unsupported version '{}'",
                query.version
            )));
        }
        if query.method != method.as_str() {
            return Err(StoreError::SignatureRejected(format!(
                "URL is valid for {} only",
                query.method
            )));
        }
        if query.expires <= now.timestamp() {
            return Err(StoreError::SignatureRejected("URL has expired".to_string()));
        }

        let provided = hex::decode(&query.signature)
            .map_err(|_| StoreError::SignatureRejected("malformed signature".to_string()))?;

        self.mac(&query.version, &query.method, key, query.expires)?
            .verify_slice(&provided)
            .map_err(|_| StoreError::SignatureRejected("signature mismatch".to_string()))
    }

    fn mac(&self, version: &str, method: &str, key: &str, expires: i64) -> Result<HmacSha256, StoreError> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|e| StoreError::Signing(e.to_string()))?;
        mac.update(format!("{version}\n{method}\n{key}\n{expires}").as_bytes());
        Ok(mac)
    }

    fn data_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let mut path = self.root.join("data");
        path.extend(key_segments(key)?);
        Ok(path)
    }

    fn meta_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let mut path = self.root.join("meta");
        path.extend(key_segments(key)?);
        let mut path = path.into_os_string();
        path.push(".json");
        Ok(PathBuf::from(path))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        let upload_err = |e: &dyn std::fmt::Display| StoreError::Upload(format!("{}: {}", key, e));

        let data_path = self.data_path(key).map_err(|e| upload_err(&e))?;
        let meta_path = self.meta_path(key).map_err(|e| upload_err(&e))?;

        let metadata = ObjectMetadata {
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
            sha256: hex::encode(Sha256::digest(&bytes)),
            uploaded_at: Utc::now(),
        };
        let meta_json = serde_json::to_vec_pretty(&metadata).map_err(|e| upload_err(&e))?;

        for path in [&data_path, &meta_path] {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| upload_err(&e))?;
            }
        }

        write_atomically(&data_path, &bytes).await.map_err(|e| upload_err(&e))?;
        write_atomically(&meta_path, &meta_json).await.map_err(|e| upload_err(&e))?;

        tracing::debug!("📦 Stored object {} ({} bytes, {})", key, metadata.size, metadata.content_type);

        Ok(())
    }

    async fn generate_signed_url(&self, key: &str, request: &SignedUrlRequest) -> Result<String, StoreError> {
        if request.expiration <= Utc::now() {
            return Err(StoreError::Signing("expiration must be in the future".to_string()));
        }

        let data_path = self.data_path(key).map_err(|e| StoreError::Signing(e.to_string()))?;
        let exists = tokio::fs::try_exists(&data_path)
            .await
            .map_err(|e| StoreError::Signing(e.to_string()))?;
        if !exists {
            return Err(StoreError::Signing(format!("no stored object for {}", key)));
        }

        let version = request.version.as_str();
        let method = request.method.as_str();
        let expires = request.expiration.timestamp();
        let signature = hex::encode(self.mac(version, method, key, expires)?.finalize().into_bytes());

        let mut url = self.public_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Signing("public URL cannot carry object paths".to_string()))?
            .pop_if_empty()
            .push(OBJECTS_ROUTE_SEGMENT)
            .extend(key.split('/'));
        url.query_pairs_mut()
            .append_pair("X-Miivvy-Algorithm", SIGNATURE_ALGORITHM)
            .append_pair("X-Miivvy-Version", version)
            .append_pair("X-Miivvy-Method", method)
            .append_pair("X-Miivvy-Expires", &expires.to_string())
            .append_pair("X-Miivvy-Signature", &signature);

        Ok(url.to_string())
    }
}

/// Write through a uniquely named temp file renamed over `path`
///
/// Readers see either the previous file or the complete new one. The temp file
/// is removed when the write or the rename fails.
async fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4()));

    let result = match tokio::fs::write(&tmp_path, contents).await {
        Ok(()) => tokio::fs::rename(&tmp_path, path).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&tmp_path).await {
            tracing::debug!("🧹 Could not remove {}: {}", tmp_path.display(), e);
        }
    }
    result
}

/// Split a key into path segments, rejecting anything that could escape the store root
fn key_segments(key: &str) -> Result<Vec<&str>, StoreError> {
    let segments: Vec<&str> = key.split('/').collect();
    let valid = segments.iter().all(|segment| {
        !segment.is_empty()
            && *segment != "."
            && *segment != ".."
            && !segment.contains(['\\', '\0'])
    });

    if valid {
        Ok(segments)
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
