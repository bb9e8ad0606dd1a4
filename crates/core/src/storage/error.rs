//! Storage error types.

use std::time::Duration;

use inkpot_shared::AppError;
use thiserror::Error;

use super::validation::format_megabytes;

/// Caller-correctable upload/delete input errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// File size is at or above the configured limit.
    #[error("image size {} MB exceeds the {max_mb} MB limit", format_megabytes(*.size_bytes))]
    TooLarge {
        /// Actual file size in bytes.
        size_bytes: u64,
        /// Configured limit in megabytes.
        max_mb: u64,
    },

    /// Extension is not on the allow-list.
    #[error("unsupported image type '{extension}', only image files can be uploaded")]
    UnsupportedType {
        /// The rejected extension, leading dot included.
        extension: String,
    },

    /// Storage key cannot address an object.
    #[error("invalid storage key: '{0}'")]
    InvalidKey(String),
}

/// Object store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object not found in storage.
    #[error("object not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Credentials were rejected or lack permission on the bucket.
    #[error("permission denied by object store: {0}")]
    PermissionDenied(String),

    /// Operation did not finish before the deadline.
    #[error("object store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Store client could not be built from configuration.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StoreError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Map an OpenDAL error raised while operating on `key`.
    #[must_use]
    pub fn from_opendal(err: &opendal::Error, key: &str) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: key.to_string(),
            },
            opendal::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}

/// Errors returned by the upload gateway. None of them is fatal to the process.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Rejected input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The upload content could not be read.
    #[error("failed to read upload content: {0}")]
    Io(#[from] std::io::Error),

    /// The object store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(e) => Self::Validation(e.to_string()),
            GatewayError::Io(e) => Self::Validation(format!("failed to read upload content: {e}")),
            GatewayError::Store(StoreError::NotFound { key }) => {
                Self::NotFound(format!("image '{key}'"))
            }
            GatewayError::Store(StoreError::Timeout(after)) => {
                Self::Timeout(format!("object store did not respond within {after:?}"))
            }
            // Store details stay in the logs.
            GatewayError::Store(_) => Self::ExternalService("object store operation failed".into()),
        }
    }
}
