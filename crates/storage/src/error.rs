//! Storage error taxonomy.
//!
//! Every adapter translates backend-specific failures into this one enum so
//! callers never branch on provider identity. Absence of a target is always
//! reported as [`StorageError::NotFound`] or a normal boolean, never conflated
//! with transport or permission failures.

use thiserror::Error;

/// Result type alias using `StorageError`.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Caller supplied malformed input. Not retryable; fix the call.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What was malformed.
        message: String,
    },

    /// Provider id is not in the registry. Raised by the factory only.
    #[error("unsupported storage provider: {provider}")]
    UnsupportedProvider {
        /// The unknown provider id.
        provider: String,
    },

    /// A required credential field is missing or blank. Raised by the
    /// factory before any adapter exists.
    #[error("missing credential field '{field}' for provider '{provider}'")]
    MissingCredential {
        /// Provider id being configured.
        provider: String,
        /// First required field that was missing or blank.
        field: String,
    },

    /// No object exists at the given path. Often a normal branch for the
    /// caller, not an error condition.
    #[error("object not found: {path}")]
    NotFound {
        /// Storage path that was not found.
        path: String,
    },

    /// Backend or transport failure on a read-side operation. Safe to retry
    /// with backoff; the adapter never retries internally.
    #[error("storage read failed for '{path}': {message}")]
    Read {
        /// Storage path involved.
        path: String,
        /// Original backend message, preserved for diagnostics.
        message: String,
    },

    /// Backend or transport failure on a write-side operation (quota,
    /// permissions, network). Safe to retry with backoff.
    #[error("storage write failed for '{path}': {message}")]
    Write {
        /// Storage path involved.
        path: String,
        /// Original backend message, preserved for diagnostics.
        message: String,
    },

    /// The caller withdrew the operation before it completed.
    #[error("storage operation cancelled")]
    Cancelled,
}

impl StorageError {
    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an unsupported provider error.
    #[must_use]
    pub fn unsupported_provider(provider: impl Into<String>) -> Self {
        Self::UnsupportedProvider {
            provider: provider.into(),
        }
    }

    /// Create a missing credential error.
    #[must_use]
    pub fn missing_credential(provider: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingCredential {
            provider: provider.into(),
            field: field.into(),
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a read failure error.
    #[must_use]
    pub fn read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Read {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a write failure error.
    #[must_use]
    pub fn write(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Translate a backend error raised by a read-side call.
    ///
    /// `NotFound` stays distinct; everything else becomes [`Self::Read`] with
    /// the backend's own message preserved.
    #[must_use]
    pub fn from_read(path: &str, err: &opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(path),
            _ => Self::read(path, err.to_string()),
        }
    }

    /// Translate a backend error raised by a write-side call.
    #[must_use]
    pub fn from_write(path: &str, err: &opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(path),
            _ => Self::write(path, err.to_string()),
        }
    }

    /// Whether a retry with backoff could succeed. Callers own retry policy.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Write { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_read_maps_not_found() {
        let backend = opendal::Error::new(opendal::ErrorKind::NotFound, "no such key");
        let err = StorageError::from_read("a/b.txt", &backend);
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn test_from_read_preserves_backend_message() {
        let backend = opendal::Error::new(opendal::ErrorKind::Unexpected, "connection reset");
        let err = StorageError::from_read("a/b.txt", &backend);
        match err {
            StorageError::Read { path, message } => {
                assert_eq!(path, "a/b.txt");
                assert!(message.contains("connection reset"));
            }
            other => panic!("expected Read, got {other:?}"),
        }
    }

    #[test]
    fn test_from_write_maps_transport_failure() {
        let backend = opendal::Error::new(opendal::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::from_write("a/b.txt", &backend);
        assert!(matches!(err, StorageError::Write { .. }));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(StorageError::read("k", "timeout").is_retryable());
        assert!(StorageError::write("k", "quota").is_retryable());
        assert!(!StorageError::not_found("k").is_retryable());
        assert!(!StorageError::invalid_argument("bad path").is_retryable());
        assert!(!StorageError::Cancelled.is_retryable());
    }
}
