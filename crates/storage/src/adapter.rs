//! The storage adapter contract.
//!
//! Every backend implements [`StorageAdapter`] with identical semantics,
//! including error semantics, so callers never special-case a provider after
//! construction. The contract is a compile-time trait; there is no abstract
//! base to mis-instantiate.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use super::error::{StorageError, StorageResult};

/// Default presigned URL expiry: 1 hour.
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 3600;

/// Maximum presigned URL expiry: 7 days (the documented S3 cap).
///
/// Requests above this are clamped, uniformly across adapters.
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 604_800;

/// Options for an upload operation.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// MIME type recorded with the object, when the backend supports it.
    pub content_type: Option<String>,
    /// Caller-supplied metadata, echoed into [`UploadResult::metadata`].
    pub metadata: HashMap<String, String>,
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadResult {
    /// Time-limited access URL for the uploaded object.
    pub url: String,
    /// Canonical key usable in subsequent download/delete/exists calls.
    pub path: String,
    /// Object metadata: at least `provider`, `size`, and the effective
    /// content type, merged with any caller-supplied metadata.
    pub metadata: HashMap<String, Value>,
}

/// Result of a connection test.
///
/// Connectivity failure is a reported outcome here, never an `Err`.
#[derive(Debug, Clone)]
pub struct ConnectionTestResult {
    /// Whether the round-trip against the backend succeeded.
    pub success: bool,
    /// Human-readable outcome, surfaced verbatim in operator tooling.
    pub message: String,
}

impl ConnectionTestResult {
    /// Create a successful result.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Create a failed result.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Capability contract every storage backend implements.
///
/// An adapter owns its credentials and settings exclusively for its lifetime
/// and is stateless beyond that; instances are safe for concurrent use by
/// multiple callers. Operations are I/O-bound async calls that never block a
/// shared worker. Dropping a returned future cancels the operation.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Registry id of the provider this adapter is bound to.
    fn provider_id(&self) -> &'static str;

    /// Upload `data` to `path`, creating or overwriting the object.
    ///
    /// Zero-length payloads are allowed. `path` must be a non-empty relative
    /// key, rejected with [`StorageError::InvalidArgument`] otherwise.
    /// Backend rejection (quota, permissions, network) surfaces as
    /// [`StorageError::Write`].
    async fn upload(
        &self,
        data: Bytes,
        path: &str,
        options: UploadOptions,
    ) -> StorageResult<UploadResult>;

    /// Download the object at `path`.
    ///
    /// Fails with [`StorageError::NotFound`] if no object exists there and
    /// [`StorageError::Read`] on backend or transport failure.
    async fn download(&self, path: &str) -> StorageResult<Bytes>;

    /// Generate a URL granting time-limited access without caller credentials.
    ///
    /// `expiry_secs` of zero is rejected with
    /// [`StorageError::InvalidArgument`]; values above
    /// [`MAX_PRESIGN_EXPIRY_SECS`] are clamped to the cap. Does not verify
    /// the object exists; callers needing that guarantee call
    /// [`Self::exists`] first.
    async fn generate_presigned_url(&self, path: &str, expiry_secs: u64) -> StorageResult<String>;

    /// Perform a lightweight round-trip against the backend.
    ///
    /// Expected connectivity failure is reported via `success = false`, never
    /// as an error; this operation exists for diagnostics, not happy-path I/O.
    async fn test_connection(&self) -> ConnectionTestResult;

    /// Delete the object at `path`.
    ///
    /// Returns `true` if an object was removed and `false` if nothing existed
    /// there; deleting a missing key is not an error. Backend failure
    /// distinct from "not found" surfaces as [`StorageError::Write`].
    async fn delete(&self, path: &str) -> StorageResult<bool>;

    /// Whether an object exists at `path`.
    ///
    /// Absence is `Ok(false)`; only backend or connectivity failure distinct
    /// from absence is an [`StorageError::Read`].
    async fn exists(&self, path: &str) -> StorageResult<bool>;
}

/// Validate a storage path as a non-empty relative key.
///
/// Shared by every adapter so path semantics cannot drift between providers.
/// Rejects empty paths, absolute paths, backslashes, NUL bytes, and `.`/`..`
/// traversal components.
pub fn validate_path(path: &str) -> StorageResult<()> {
    if path.is_empty() {
        return Err(StorageError::invalid_argument("path must not be empty"));
    }
    if path.starts_with('/') {
        return Err(StorageError::invalid_argument(format!(
            "path must be relative: {path}"
        )));
    }
    if path.contains('\\') || path.contains('\0') {
        return Err(StorageError::invalid_argument(format!(
            "path contains forbidden characters: {path}"
        )));
    }
    if path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(StorageError::invalid_argument(format!(
            "path contains empty or traversal components: {path}"
        )));
    }
    Ok(())
}

/// Validate and clamp a presign expiry.
///
/// Zero is rejected; values above [`MAX_PRESIGN_EXPIRY_SECS`] are clamped.
pub fn clamp_expiry(expiry_secs: u64) -> StorageResult<u64> {
    if expiry_secs == 0 {
        return Err(StorageError::invalid_argument(
            "presign expiry must be a positive number of seconds",
        ));
    }
    Ok(expiry_secs.min(MAX_PRESIGN_EXPIRY_SECS))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("docs/contract.pdf")]
    #[case("a/b.txt")]
    #[case("single")]
    #[case("deep/nested/tree/file.bin")]
    #[case("with-dash_and.dot")]
    fn test_validate_path_accepts(#[case] path: &str) {
        assert!(validate_path(path).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("/absolute/key")]
    #[case("a//b")]
    #[case("a/./b")]
    #[case("../escape")]
    #[case("a/../b")]
    #[case("back\\slash")]
    #[case("trailing/")]
    fn test_validate_path_rejects(#[case] path: &str) {
        let err = validate_path(path).unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument { .. }));
    }

    #[test]
    fn test_clamp_expiry_rejects_zero() {
        let err = clamp_expiry(0).unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument { .. }));
    }

    #[test]
    fn test_clamp_expiry_passes_and_caps() {
        assert_eq!(clamp_expiry(1).expect("positive expiry"), 1);
        assert_eq!(
            clamp_expiry(DEFAULT_PRESIGN_EXPIRY_SECS).expect("default expiry"),
            DEFAULT_PRESIGN_EXPIRY_SECS
        );
        assert_eq!(
            clamp_expiry(MAX_PRESIGN_EXPIRY_SECS + 1).expect("over-cap expiry"),
            MAX_PRESIGN_EXPIRY_SECS
        );
    }
}

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use super::*;

    // Property: accepted paths never contain traversal components and are
    // always relative.
    proptest! {
        #[test]
        fn prop_accepted_paths_are_clean(path in ".*") {
            if validate_path(&path).is_ok() {
                prop_assert!(!path.is_empty());
                prop_assert!(!path.starts_with('/'));
                prop_assert!(!path.contains('\\'));
                for seg in path.split('/') {
                    prop_assert!(!seg.is_empty());
                    prop_assert!(seg != "." && seg != "..");
                }
            }
        }
    }

    // Property: clamped expiry is always positive and never above the cap.
    proptest! {
        #[test]
        fn prop_clamped_expiry_within_bounds(expiry in 1u64..u64::MAX) {
            let clamped = clamp_expiry(expiry).expect("positive expiry");
            prop_assert!(clamped >= 1);
            prop_assert!(clamped <= MAX_PRESIGN_EXPIRY_SECS);
            if expiry <= MAX_PRESIGN_EXPIRY_SECS {
                prop_assert_eq!(clamped, expiry);
            }
        }
    }
}
