//! Provider registry and adapter factory.

use std::sync::Arc;

use tracing::debug;

use super::adapter::StorageAdapter;
use super::credentials::{Credentials, Settings};
use super::error::{StorageError, StorageResult};
use super::memory::MemoryAdapter;
use super::object_store::ObjectStoreAdapter;

/// Static metadata describing one supported provider.
///
/// Used for discovery and validation only, never mutated. Configuration
/// surfaces render `required_credentials` as a secret-field form and reject
/// blank fields client-side; the factory repeats that validation as the
/// backstop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ProviderDescriptor {
    /// Stable provider id passed to [`AdapterFactory::create_adapter`].
    pub id: &'static str,
    /// Display name for configuration UIs.
    pub name: &'static str,
    /// One-line description of the backend.
    pub description: &'static str,
    /// Credential fields that must be present and non-blank, in the order a
    /// form should prompt for them.
    pub required_credentials: &'static [&'static str],
}

/// Supported providers, in registration order. Read-only after process start.
pub const PROVIDERS: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        id: "s3",
        name: "S3-compatible object storage",
        description: "AWS S3, Cloudflare R2, Supabase, MinIO and other S3 API backends",
        required_credentials: &["access_key_id", "secret_access_key", "bucket", "region"],
    },
    ProviderDescriptor {
        id: "azure_blob",
        name: "Azure Blob Storage",
        description: "Azure Blob Storage containers",
        required_credentials: &["account", "access_key", "container"],
    },
    ProviderDescriptor {
        id: "local",
        name: "Local filesystem",
        description: "Objects stored under a local directory (development)",
        required_credentials: &["root"],
    },
    ProviderDescriptor {
        id: "memory",
        name: "In-memory",
        description: "Process-local in-memory store for tests and dry runs",
        required_credentials: &[],
    },
];

/// Factory for creating storage adapters.
///
/// Stateless; each call is an independent pure function over the static
/// registry.
pub struct AdapterFactory;

impl AdapterFactory {
    /// Create the adapter for `provider`, bound to the given credentials and
    /// settings.
    ///
    /// Validates that every field in the matched descriptor's
    /// `required_credentials` is present and non-blank before constructing.
    /// Construction performs no network I/O; connectivity is verified lazily
    /// via [`StorageAdapter::test_connection`].
    ///
    /// # Errors
    ///
    /// * [`StorageError::UnsupportedProvider`] if `provider` is not in the
    ///   registry.
    /// * [`StorageError::MissingCredential`] naming the first missing or
    ///   blank required field.
    pub fn create_adapter(
        provider: &str,
        credentials: &Credentials,
        settings: &Settings,
    ) -> StorageResult<Arc<dyn StorageAdapter>> {
        let descriptor = PROVIDERS
            .iter()
            .find(|d| d.id == provider)
            .ok_or_else(|| StorageError::unsupported_provider(provider))?;

        for field in descriptor.required_credentials {
            if !credentials.has(field) {
                return Err(StorageError::missing_credential(descriptor.id, *field));
            }
        }

        debug!(provider = descriptor.id, "creating storage adapter");

        let adapter: Arc<dyn StorageAdapter> = match descriptor.id {
            "s3" => Arc::new(ObjectStoreAdapter::s3(credentials, settings)?),
            "azure_blob" => Arc::new(ObjectStoreAdapter::azure_blob(credentials, settings)?),
            "local" => Arc::new(ObjectStoreAdapter::local(credentials, settings)?),
            "memory" => Arc::new(MemoryAdapter::new(settings)),
            other => return Err(StorageError::unsupported_provider(other)),
        };

        Ok(adapter)
    }

    /// The static provider registry, in stable registration order.
    #[must_use]
    pub const fn supported_providers() -> &'static [ProviderDescriptor] {
        PROVIDERS
    }
}
