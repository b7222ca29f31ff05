//! Reference adapter backed by Apache OpenDAL.
//!
//! One generic adapter serves every object-store backend (S3-compatible,
//! Azure Blob, local filesystem) through a single OpenDAL `Operator`, instead
//! of one hand-written client per provider.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};
use serde_json::Value;
use tracing::debug;

use super::adapter::{
    ConnectionTestResult, DEFAULT_PRESIGN_EXPIRY_SECS, StorageAdapter, UploadOptions, UploadResult,
    clamp_expiry, validate_path,
};
use super::credentials::{Credentials, Settings};
use super::error::{StorageError, StorageResult};

/// Content type recorded when the caller supplies none.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Which OpenDAL service an adapter instance is bound to.
#[derive(Debug, Clone)]
enum Backend {
    S3,
    AzureBlob,
    /// Local filesystem; keeps the root for `file://` URL synthesis since the
    /// fs service has no presign capability.
    LocalFs {
        root: String,
    },
}

/// Storage adapter over an OpenDAL operator.
///
/// Settings knobs: `path_prefix` (joined in front of every backend key; the
/// caller-visible canonical path stays unprefixed), `presign_expiry_secs`
/// (expiry of the URL returned from uploads, default 1 hour), and `endpoint`
/// (for `s3` an R2/Supabase/MinIO style endpoint override; for `azure_blob`
/// an override of the account's default blob endpoint).
///
/// Presign expiry above the 7-day cap is clamped, never rejected; zero is
/// rejected. Consistent across all calls on all instances.
pub struct ObjectStoreAdapter {
    operator: Operator,
    backend: Backend,
    path_prefix: Option<String>,
    upload_url_expiry_secs: u64,
}

impl ObjectStoreAdapter {
    /// Create an adapter for an S3-compatible backend.
    ///
    /// Required credentials: `access_key_id`, `secret_access_key`, `bucket`,
    /// `region`. Construction performs no network I/O.
    pub fn s3(credentials: &Credentials, settings: &Settings) -> StorageResult<Self> {
        let mut builder = services::S3::default()
            .bucket(require(credentials, "s3", "bucket")?)
            .access_key_id(require(credentials, "s3", "access_key_id")?)
            .secret_access_key(require(credentials, "s3", "secret_access_key")?)
            .region(require(credentials, "s3", "region")?);

        if let Some(endpoint) = settings.get("endpoint") {
            builder = builder.endpoint(endpoint);
        }

        let operator = Operator::new(builder)
            .map_err(|e| StorageError::invalid_argument(e.to_string()))?
            .finish();

        Ok(Self::with_operator(operator, Backend::S3, settings))
    }

    /// Create an adapter for Azure Blob Storage.
    ///
    /// Required credentials: `account`, `access_key`, `container`. The blob
    /// endpoint defaults to `https://{account}.blob.core.windows.net` and can
    /// be overridden with the `endpoint` setting (Azurite, sovereign clouds).
    pub fn azure_blob(credentials: &Credentials, settings: &Settings) -> StorageResult<Self> {
        let account = require(credentials, "azure_blob", "account")?;
        let endpoint = settings
            .get("endpoint")
            .map_or_else(|| format!("https://{account}.blob.core.windows.net"), String::from);

        let builder = services::Azblob::default()
            .endpoint(&endpoint)
            .account_name(account)
            .account_key(require(credentials, "azure_blob", "access_key")?)
            .container(require(credentials, "azure_blob", "container")?);

        let operator = Operator::new(builder)
            .map_err(|e| StorageError::invalid_argument(e.to_string()))?
            .finish();

        Ok(Self::with_operator(operator, Backend::AzureBlob, settings))
    }

    /// Create an adapter for the local filesystem.
    ///
    /// Required credentials: `root` (directory all keys resolve under).
    /// Presigned URLs are synthesized `file://` URLs since the filesystem
    /// has no presign support; the expiry is advisory.
    pub fn local(credentials: &Credentials, settings: &Settings) -> StorageResult<Self> {
        let root = require(credentials, "local", "root")?.to_string();
        let builder = services::Fs::default().root(&root);

        let operator = Operator::new(builder)
            .map_err(|e| StorageError::invalid_argument(e.to_string()))?
            .finish();

        Ok(Self::with_operator(
            operator,
            Backend::LocalFs { root },
            settings,
        ))
    }

    fn with_operator(operator: Operator, backend: Backend, settings: &Settings) -> Self {
        Self {
            operator,
            backend,
            path_prefix: settings
                .get("path_prefix")
                .map(|p| p.trim_matches('/').to_string())
                .filter(|p| !p.is_empty()),
            upload_url_expiry_secs: settings
                .get_u64("presign_expiry_secs")
                .unwrap_or(DEFAULT_PRESIGN_EXPIRY_SECS),
        }
    }

    /// Backend key for a caller-visible path.
    fn backend_key(&self, path: &str) -> String {
        match &self.path_prefix {
            Some(prefix) => format!("{prefix}/{path}"),
            None => path.to_string(),
        }
    }

    /// Access URL for a key, presigned where the backend supports it.
    async fn access_url(&self, path: &str, expiry_secs: u64) -> StorageResult<String> {
        let key = self.backend_key(path);

        if let Backend::LocalFs { root } = &self.backend {
            let root = root.trim_end_matches('/');
            return Ok(format!("file://{root}/{key}"));
        }

        let presigned = self
            .operator
            .presign_read(&key, Duration::from_secs(expiry_secs))
            .await
            .map_err(|e| StorageError::from_read(path, &e))?;

        Ok(presigned.uri().to_string())
    }
}

#[async_trait::async_trait]
impl StorageAdapter for ObjectStoreAdapter {
    fn provider_id(&self) -> &'static str {
        match self.backend {
            Backend::S3 => "s3",
            Backend::AzureBlob => "azure_blob",
            Backend::LocalFs { .. } => "local",
        }
    }

    async fn upload(
        &self,
        data: Bytes,
        path: &str,
        options: UploadOptions,
    ) -> StorageResult<UploadResult> {
        validate_path(path)?;
        let key = self.backend_key(path);
        let size = data.len();
        let content_type = options
            .content_type
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

        debug!(provider = self.provider_id(), path, size, "uploading object");

        self.operator
            .write_with(&key, data)
            .content_type(&content_type)
            .await
            .map_err(|e| StorageError::from_write(path, &e))?;

        let url = self.access_url(path, self.upload_url_expiry_secs).await?;

        let mut metadata: HashMap<String, Value> = options
            .metadata
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        metadata.insert(
            "provider".to_string(),
            Value::String(self.provider_id().to_string()),
        );
        metadata.insert("size".to_string(), Value::from(size));
        metadata.insert("content_type".to_string(), Value::String(content_type));

        Ok(UploadResult {
            url,
            path: path.to_string(),
            metadata,
        })
    }

    async fn download(&self, path: &str) -> StorageResult<Bytes> {
        validate_path(path)?;
        let key = self.backend_key(path);

        debug!(provider = self.provider_id(), path, "downloading object");

        let buffer = self
            .operator
            .read(&key)
            .await
            .map_err(|e| StorageError::from_read(path, &e))?;

        Ok(buffer.to_bytes())
    }

    async fn generate_presigned_url(&self, path: &str, expiry_secs: u64) -> StorageResult<String> {
        validate_path(path)?;
        let expiry = clamp_expiry(expiry_secs)?;
        self.access_url(path, expiry).await
    }

    async fn test_connection(&self) -> ConnectionTestResult {
        match self.operator.check().await {
            Ok(()) => ConnectionTestResult::ok(format!(
                "{} backend reachable with supplied credentials",
                self.provider_id()
            )),
            Err(e) => ConnectionTestResult::failed(e.to_string()),
        }
    }

    async fn delete(&self, path: &str) -> StorageResult<bool> {
        validate_path(path)?;
        let key = self.backend_key(path);

        // OpenDAL's delete is unconditionally idempotent, so stat first to
        // report whether anything was actually removed.
        match self.operator.stat(&key).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StorageError::write(path, e.to_string())),
        }

        self.operator
            .delete(&key)
            .await
            .map_err(|e| StorageError::write(path, e.to_string()))?;

        debug!(provider = self.provider_id(), path, "deleted object");
        Ok(true)
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        validate_path(path)?;
        let key = self.backend_key(path);

        match self.operator.stat(&key).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::read(path, e.to_string())),
        }
    }
}

fn require<'a>(
    credentials: &'a Credentials,
    provider: &str,
    field: &str,
) -> StorageResult<&'a str> {
    credentials
        .get(field)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| StorageError::missing_credential(provider, field))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    static TEST_DIR_SEQ: AtomicU64 = AtomicU64::new(0);

    fn temp_root() -> PathBuf {
        let seq = TEST_DIR_SEQ.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "stowage-object-store-test-{}-{seq}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("create temp root");
        dir
    }

    fn local_adapter(root: &std::path::Path) -> ObjectStoreAdapter {
        let creds = Credentials::new().with("root", root.to_string_lossy());
        ObjectStoreAdapter::local(&creds, &Settings::new()).expect("local adapter")
    }

    #[test]
    fn test_construction_requires_credentials() {
        let err = ObjectStoreAdapter::s3(&Credentials::new(), &Settings::new())
            .err()
            .expect("missing s3 credentials must be rejected");
        assert!(matches!(
            err,
            StorageError::MissingCredential { ref field, .. } if field == "bucket"
        ));

        let err =
            ObjectStoreAdapter::azure_blob(&Credentials::new().with("account", "dev"), &Settings::new())
                .err()
                .expect("missing azure credentials must be rejected");
        assert!(matches!(
            err,
            StorageError::MissingCredential { ref field, .. } if field == "access_key"
        ));
    }

    #[test]
    fn test_azure_blob_constructs_without_explicit_endpoint() {
        // The blob endpoint is derived from the account name, so a credential
        // set matching the registry descriptor is sufficient on its own.
        let creds = Credentials::new()
            .with("account", "stowagedev")
            .with("access_key", "YWNjZXNzLWtleQ==")
            .with("container", "objects");

        let adapter = ObjectStoreAdapter::azure_blob(&creds, &Settings::new())
            .expect("construction with derived endpoint");
        assert_eq!(adapter.provider_id(), "azure_blob");

        let settings = Settings::new().with("endpoint", "http://127.0.0.1:10000/stowagedev");
        let adapter = ObjectStoreAdapter::azure_blob(&creds, &settings)
            .expect("construction with endpoint override");
        assert_eq!(adapter.provider_id(), "azure_blob");
    }

    #[test]
    fn test_construction_performs_no_io() {
        // Credentials are syntactically fine but point nowhere; construction
        // must still succeed because connectivity is verified lazily.
        let creds = Credentials::new()
            .with("access_key_id", "AKIA000")
            .with("secret_access_key", "secret")
            .with("bucket", "no-such-bucket")
            .with("region", "us-east-1");
        let settings = Settings::new().with("endpoint", "http://127.0.0.1:1");

        let adapter = ObjectStoreAdapter::s3(&creds, &settings).expect("lazy construction");
        assert_eq!(adapter.provider_id(), "s3");
    }

    #[test]
    fn test_backend_key_applies_prefix() {
        let root = temp_root();
        let creds = Credentials::new().with("root", root.to_string_lossy());
        let settings = Settings::new().with("path_prefix", "/tenant-a/");
        let adapter = ObjectStoreAdapter::local(&creds, &settings).expect("local adapter");

        assert_eq!(adapter.backend_key("a/b.txt"), "tenant-a/a/b.txt");
    }

    #[tokio::test]
    async fn test_local_round_trip() {
        let root = temp_root();
        let adapter = local_adapter(&root);
        let payload = Bytes::from_static(b"local bytes");

        let result = adapter
            .upload(payload.clone(), "a/b.txt", UploadOptions::default())
            .await
            .expect("upload");
        assert_eq!(result.path, "a/b.txt");
        assert!(result.url.starts_with("file://"));

        let downloaded = adapter.download("a/b.txt").await.expect("download");
        assert_eq!(downloaded, payload);

        assert!(adapter.exists("a/b.txt").await.expect("exists"));
        assert!(adapter.delete("a/b.txt").await.expect("delete"));
        assert!(!adapter.exists("a/b.txt").await.expect("exists after delete"));
    }

    #[tokio::test]
    async fn test_local_download_missing_is_not_found() {
        let root = temp_root();
        let adapter = local_adapter(&root);

        let err = adapter.download("missing/key.bin").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_local_delete_missing_returns_false() {
        let root = temp_root();
        let adapter = local_adapter(&root);

        assert!(!adapter.delete("missing/key.bin").await.expect("delete"));
    }

    #[tokio::test]
    async fn test_local_presign_synthesizes_file_url() {
        let root = temp_root();
        let adapter = local_adapter(&root);

        let url = adapter
            .generate_presigned_url("docs/report.pdf", 60)
            .await
            .expect("presign");
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("docs/report.pdf"));
    }

    #[tokio::test]
    async fn test_local_presign_rejects_zero_expiry() {
        let root = temp_root();
        let adapter = local_adapter(&root);

        let err = adapter
            .generate_presigned_url("docs/report.pdf", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_local_upload_rejects_malformed_path() {
        let root = temp_root();
        let adapter = local_adapter(&root);

        let err = adapter
            .upload(Bytes::new(), "../escape", UploadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_local_zero_length_upload_allowed() {
        let root = temp_root();
        let adapter = local_adapter(&root);

        let result = adapter
            .upload(Bytes::new(), "empty.bin", UploadOptions::default())
            .await
            .expect("zero-length upload");
        assert_eq!(result.metadata.get("size"), Some(&Value::from(0)));

        let downloaded = adapter.download("empty.bin").await.expect("download");
        assert!(downloaded.is_empty());
    }
}
