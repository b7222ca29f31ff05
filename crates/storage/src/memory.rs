//! In-memory storage adapter.
//!
//! A real second implementation of the contract rather than a call recorder:
//! the backend is a map from path to bytes held inside the adapter instance,
//! giving deterministic round-trip tests without network mocking.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use serde_json::Value;

use super::adapter::{
    ConnectionTestResult, StorageAdapter, UploadOptions, UploadResult, clamp_expiry, validate_path,
};
use super::credentials::Settings;
use super::error::{StorageError, StorageResult};

/// Storage adapter backed by process memory.
///
/// Registered as provider id `memory` with no required credentials. Shares
/// path validation and expiry clamping with the reference adapter, so its
/// semantics are identical; only the backing store differs. Presigned URLs
/// are deterministic `memory://` strings.
#[derive(Default)]
pub struct MemoryAdapter {
    objects: RwLock<HashMap<String, Bytes>>,
    path_prefix: Option<String>,
}

impl MemoryAdapter {
    /// Create an empty in-memory adapter.
    ///
    /// The only recognized setting is `path_prefix`.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            path_prefix: settings
                .get("path_prefix")
                .map(|p| p.trim_matches('/').to_string())
                .filter(|p| !p.is_empty()),
        }
    }

    fn backend_key(&self, path: &str) -> String {
        match &self.path_prefix {
            Some(prefix) => format!("{prefix}/{path}"),
            None => path.to_string(),
        }
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl StorageAdapter for MemoryAdapter {
    fn provider_id(&self) -> &'static str {
        "memory"
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
            .unwrap_or_else(|| "application/octet-stream".to_string());

        self.objects
            .write()
            .map_err(|e| StorageError::write(path, e.to_string()))?
            .insert(key.clone(), data);

        let mut metadata: HashMap<String, Value> = options
            .metadata
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        metadata.insert("provider".to_string(), Value::String("memory".to_string()));
        metadata.insert("size".to_string(), Value::from(size));
        metadata.insert("content_type".to_string(), Value::String(content_type));

        Ok(UploadResult {
            url: format!("memory://{key}"),
            path: path.to_string(),
            metadata,
        })
    }

    async fn download(&self, path: &str) -> StorageResult<Bytes> {
        validate_path(path)?;
        let key = self.backend_key(path);

        self.objects
            .read()
            .map_err(|e| StorageError::read(path, e.to_string()))?
            .get(&key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(path))
    }

    async fn generate_presigned_url(&self, path: &str, expiry_secs: u64) -> StorageResult<String> {
        validate_path(path)?;
        let expiry = clamp_expiry(expiry_secs)?;
        Ok(format!(
            "memory://{}?expires_in={expiry}",
            self.backend_key(path)
        ))
    }

    async fn test_connection(&self) -> ConnectionTestResult {
        ConnectionTestResult::ok("in-memory backend always reachable")
    }

    async fn delete(&self, path: &str) -> StorageResult<bool> {
        validate_path(path)?;
        let key = self.backend_key(path);

        Ok(self
            .objects
            .write()
            .map_err(|e| StorageError::write(path, e.to_string()))?
            .remove(&key)
            .is_some())
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        validate_path(path)?;
        let key = self.backend_key(path);

        Ok(self
            .objects
            .read()
            .map_err(|e| StorageError::read(path, e.to_string()))?
            .contains_key(&key))
    }
}
