//! Pluggable storage-provider abstraction for Stowage.
//!
//! This crate defines a uniform async contract for uploading, downloading,
//! deleting, checking existence of, and generating temporary access URLs for
//! binary objects, independent of which physical backend is configured.
//!
//! # Modules
//!
//! - `adapter` - The [`StorageAdapter`] capability contract and shared shapes
//! - `credentials` - Secret credential and settings maps
//! - `error` - Uniform error taxonomy across every backend
//! - `factory` - Provider registry and [`AdapterFactory`]
//! - `object_store` - Reference adapter over Apache OpenDAL (S3, Azure Blob,
//!   local filesystem)
//! - `memory` - In-memory adapter for tests and dry runs
//!
//! # Usage
//!
//! Callers resolve a provider configuration, ask the factory for an adapter,
//! and issue operations without ever branching on provider identity:
//!
//! ```
//! use stowage_storage::{AdapterFactory, Credentials, Settings};
//!
//! let credentials = Credentials::new().with("root", "/var/lib/stowage");
//! let adapter = AdapterFactory::create_adapter("local", &credentials, &Settings::new())?;
//! # let _ = adapter;
//! # Ok::<(), stowage_storage::StorageError>(())
//! ```

pub mod adapter;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod memory;
pub mod object_store;

pub use adapter::{
    ConnectionTestResult, DEFAULT_PRESIGN_EXPIRY_SECS, MAX_PRESIGN_EXPIRY_SECS, StorageAdapter,
    UploadOptions, UploadResult,
};
pub use credentials::{Credentials, Settings};
pub use error::{StorageError, StorageResult};
pub use factory::{AdapterFactory, PROVIDERS, ProviderDescriptor};
pub use memory::MemoryAdapter;
pub use object_store::ObjectStoreAdapter;
