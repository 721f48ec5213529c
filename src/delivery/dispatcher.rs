/// Delivery channels for serialized shortcuts
///
/// - Direct: attachment response with the dated filename
/// - Inline: base64 payload inside JSON
/// - Signed reference: upload to the object store, then a GET-only URL valid for 7 days

use crate::error::ShortcutError;
use crate::shortcut::{SHORTCUT_CONTENT_TYPE, SHORTCUT_EXTENSION};
use crate::storage::{ObjectStore, SignedUrlRequest, SigningVersion, StoreError};
use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use std::sync::Arc;

/// Lifetime of signed URLs
pub const SIGNED_URL_TTL_DAYS: i64 = 7;

/// Characters escaped in an RFC 5987 `filename*` value (everything but attr-char)
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Check that a user id can name both a download and an object-store path segment
///
/// Every delivery channel runs this, so an id is accepted or rejected the same
/// way whether it is downloaded, inlined or uploaded.
pub fn validate_user_id(user_id: &str) -> Result<(), ShortcutError> {
    let reason = if user_id == "." || user_id == ".." {
        Some("must not be a relative path component")
    } else if user_id.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if user_id.chars().any(char::is_control) {
        Some("must not contain control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => {
            tracing::warn!("❌ Rejected user id {:?}: {}", user_id, reason);
            Err(ShortcutError::InvalidUserId(reason.to_string()))
        }
        None => Ok(()),
    }
}

/// Base artifact name: `Miivvy_{APPID_UPPER}_{user_id}`
pub fn artifact_stem(app_id: &str, user_id: &str) -> String {
    format!("Miivvy_{}_{}", app_id.to_uppercase(), user_id)
}

/// Download filename: `Miivvy_{APPID_UPPER}_{user_id}_{YYYYMMDD}.shortcut`
pub fn download_filename(app_id: &str, user_id: &str, issued_on: NaiveDate) -> String {
    format!(
        "{}_{}.{}",
        artifact_stem(app_id, user_id),
        issued_on.format("%Y%m%d"),
        SHORTCUT_EXTENSION
    )
}

/// Object-store key: `shortcuts/{user_id}/{app_id}/Miivvy_{APPID_UPPER}_{user_id}.shortcut`
pub fn object_key(app_id: &str, user_id: &str) -> String {
    format!(
        "shortcuts/{}/{}/{}.{}",
        user_id,
        app_id,
        artifact_stem(app_id, user_id),
        SHORTCUT_EXTENSION
    )
}

/// Serialized shortcut ready for direct download
#[derive(Debug, Clone)]
pub struct DeliveryArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

impl DeliveryArtifact {
    pub fn new(bytes: Vec<u8>, app_id: &str, user_id: &str, issued_on: NaiveDate) -> Self {
        Self {
            bytes,
            filename: download_filename(app_id, user_id, issued_on),
            content_type: SHORTCUT_CONTENT_TYPE,
        }
    }
}

impl IntoResponse for DeliveryArtifact {
    fn into_response(self) -> Response {
        let disposition = content_disposition(&self.filename);
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, self.content_type.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// Base64 channel payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineArtifact {
    pub data: String,
    pub name: String,
}

/// A stored artifact and the signed URL granting access to it
#[derive(Debug, Clone)]
pub struct SignedReference {
    pub key: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
    pub method: Method,
}

/// Routes serialized shortcuts to a delivery channel
#[derive(Clone)]
pub struct DeliveryDispatcher {
    store: Arc<dyn ObjectStore>,
}

impl DeliveryDispatcher {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Attachment response; cannot fail once bytes exist
    pub fn direct(&self, artifact: DeliveryArtifact) -> Response {
        tracing::info!("📤 Delivering {} ({} bytes)", artifact.filename, artifact.bytes.len());
        artifact.into_response()
    }

    /// Base64-encode the artifact for embedding in JSON
    pub fn inline_base64(&self, bytes: &[u8], app_id: &str, user_id: &str) -> InlineArtifact {
        InlineArtifact {
            data: STANDARD.encode(bytes),
            name: artifact_stem(app_id, user_id),
        }
    }

    /// Upload the artifact under its fixed key and issue a GET-only URL valid for 7 days
    ///
    /// Every call re-uploads. A signing failure leaves the uploaded object in place.
    pub async fn signed_reference(
        &self,
        bytes: Vec<u8>,
        user_id: &str,
        app_id: &str,
    ) -> Result<SignedReference, StoreError> {
        let key = object_key(app_id, user_id);

        tracing::info!("☁️ Uploading shortcut to {}", key);
        self.store
            .put_object(&key, bytes, SHORTCUT_CONTENT_TYPE)
            .await
            .map_err(|e| match e {
                StoreError::Upload(_) | StoreError::InvalidKey(_) => e,
                other => StoreError::Upload(other.to_string()),
            })?;

        let request = SignedUrlRequest {
            version: SigningVersion::V4,
            expiration: Utc::now() + Duration::days(SIGNED_URL_TTL_DAYS),
            method: Method::GET,
        };
        let url = self
            .store
            .generate_signed_url(&key, &request)
            .await
            .map_err(|e| match e {
                StoreError::Signing(_) => e,
                other => StoreError::Signing(other.to_string()),
            })?;

        tracing::info!("🔗 Issued signed URL for {} (expires {})", key, request.expiration.to_rfc3339());

        Ok(SignedReference {
            key,
            url,
            expires_at: request.expiration,
            method: request.method,
        })
    }
}

/// `attachment` disposition; names that do not fit a quoted ASCII parameter also
/// carry the exact name as `filename*=UTF-8''...`
fn content_disposition(filename: &str) -> String {
    let fallback = header_safe(filename);
    if fallback == filename {
        format!("attachment; filename=\"{}\"", fallback)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            utf8_percent_encode(filename, FILENAME_ENCODE_SET)
        )
    }
}

/// Replace characters that cannot appear inside a quoted header parameter
fn header_safe(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Store double recording calls, optionally failing one of the two operations
    #[derive(Default)]
    struct RecordingStore {
        fail_put: bool,
        fail_sign: bool,
        puts: Mutex<Vec<(String, usize, String)>>,
        signs: Mutex<Vec<(String, SignedUrlRequest)>>,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
            if self.fail_put {
                return Err(StoreError::Upload("bucket unreachable".to_string()));
            }
            self.puts
                .lock()
                .unwrap()
                .push((key.to_string(), bytes.len(), content_type.to_string()));
            Ok(())
        }

        async fn generate_signed_url(&self, key: &str, request: &SignedUrlRequest) -> Result<String, StoreError> {
            if self.fail_sign {
                return Err(StoreError::Configuration("no signing credentials".to_string()));
            }
            self.signs.lock().unwrap().push((key.to_string(), request.clone()));
            Ok(format!("https://store.example.com/{}?sig=abc", key))
        }
    }

    fn dispatcher(store: Arc<RecordingStore>) -> DeliveryDispatcher {
        DeliveryDispatcher::new(store)
    }

    #[test]
    fn names_follow_artifact_convention() {
        let day = NaiveDate::from_ymd_opt(2025, 10, 21).unwrap();

        assert_eq!(artifact_stem("line", "u1"), "Miivvy_LINE_u1");
        assert_eq!(download_filename("line", "u1", day), "Miivvy_LINE_u1_20251021.shortcut");
        assert_eq!(object_key("line", "u1"), "shortcuts/u1/line/Miivvy_LINE_u1.shortcut");
    }

    #[test]
    fn inline_base64_encodes_bytes() {
        let dispatcher = dispatcher(Arc::new(RecordingStore::default()));
        let inline = dispatcher.inline_base64(b"<plist/>", "line", "u1");

        assert_eq!(inline.data, STANDARD.encode(b"<plist/>"));
        assert_eq!(inline.name, "Miivvy_LINE_u1");
    }

    #[test]
    fn direct_sets_attachment_headers() {
        let dispatcher = dispatcher(Arc::new(RecordingStore::default()));
        let day = NaiveDate::from_ymd_opt(2025, 10, 21).unwrap();
        let response = dispatcher.direct(DeliveryArtifact::new(b"abc".to_vec(), "line", "u\"1", day));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/x-plist");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Miivvy_LINE_u_1_20251021.shortcut\"; filename*=UTF-8''Miivvy_LINE_u%221_20251021.shortcut"
        );
    }

    #[test]
    fn ascii_filename_has_no_extended_parameter() {
        assert_eq!(
            content_disposition("Miivvy_LINE_u1_20251021.shortcut"),
            "attachment; filename=\"Miivvy_LINE_u1_20251021.shortcut\""
        );
    }

    #[test]
    fn non_ascii_filename_keeps_exact_name() {
        let day = NaiveDate::from_ymd_opt(2025, 10, 21).unwrap();
        let artifact = DeliveryArtifact::new(b"abc".to_vec(), "line", "ユーザー1", day);
        assert_eq!(artifact.filename, "Miivvy_LINE_ユーザー1_20251021.shortcut");

        let response = artifact.into_response();
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Miivvy_LINE_____1_20251021.shortcut\"; \
             filename*=UTF-8''Miivvy_LINE_%E3%83%A6%E3%83%BC%E3%82%B6%E3%83%BC1_20251021.shortcut"
        );
    }

    #[test]
    fn user_ids_that_cannot_name_a_path_segment_are_rejected() {
        for user_id in [".", "..", "a/b", "a\\b", "a\nb"] {
            assert!(
                matches!(validate_user_id(user_id), Err(ShortcutError::InvalidUserId(_))),
                "{:?}",
                user_id
            );
        }
        for user_id in ["u1", "user.name", "ユーザー1", "a b"] {
            assert!(validate_user_id(user_id).is_ok(), "{:?}", user_id);
        }
    }

    #[tokio::test]
    async fn signed_reference_uploads_then_signs_for_get() {
        let store = Arc::new(RecordingStore::default());
        let dispatcher = dispatcher(Arc::clone(&store));

        let before = Utc::now();
        let reference = dispatcher.signed_reference(b"abc".to_vec(), "u1", "line").await.unwrap();

        assert_eq!(reference.key, "shortcuts/u1/line/Miivvy_LINE_u1.shortcut");
        assert_eq!(reference.method, Method::GET);
        let ttl = reference.expires_at - before;
        assert!(ttl >= Duration::days(7) && ttl < Duration::days(7) + Duration::seconds(5));

        let puts = store.puts.lock().unwrap();
        assert_eq!(puts.as_slice(), &[(reference.key.clone(), 3, "application/x-plist".to_string())]);
        let signs = store.signs.lock().unwrap();
        assert_eq!(signs.len(), 1);
        assert_eq!(signs[0].1.method, Method::GET);
        assert_eq!(signs[0].1.version, SigningVersion::V4);
    }

    #[tokio::test]
    async fn upload_failure_skips_signing() {
        let store = Arc::new(RecordingStore {
            fail_put: true,
            ..Default::default()
        });
        let dispatcher = dispatcher(Arc::clone(&store));

        let result = dispatcher.signed_reference(b"abc".to_vec(), "u1", "line").await;
        assert!(matches!(result, Err(StoreError::Upload(_))));
        assert!(store.signs.lock().unwrap().is_empty());
    }

    /// Store that rejects keys the way the filesystem store does
    struct KeyCheckingStore;

    #[async_trait]
    impl ObjectStore for KeyCheckingStore {
        async fn put_object(&self, key: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<(), StoreError> {
            Err(StoreError::InvalidKey(key.to_string()))
        }

        async fn generate_signed_url(&self, _key: &str, _request: &SignedUrlRequest) -> Result<String, StoreError> {
            unreachable!("signing must not run after a rejected key")
        }
    }

    #[tokio::test]
    async fn invalid_key_is_not_reported_as_upload_failure() {
        let dispatcher = DeliveryDispatcher::new(Arc::new(KeyCheckingStore));
        let result = dispatcher.signed_reference(b"abc".to_vec(), "..", "line").await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn signing_failure_keeps_uploaded_object() {
        let store = Arc::new(RecordingStore {
            fail_sign: true,
            ..Default::default()
        });
        let dispatcher = dispatcher(Arc::clone(&store));

        let result = dispatcher.signed_reference(b"abc".to_vec(), "u1", "line").await;
        assert!(matches!(result, Err(StoreError::Signing(_))));
        assert_eq!(store.puts.lock().unwrap().len(), 1);
    }
}
