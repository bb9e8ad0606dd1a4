//! Storage configuration types.

use std::collections::HashSet;
use std::time::Duration;

use inkpot_shared::{StorageSettings, UploadSettings};

use super::validation::BYTES_PER_MB;

/// Cloudflare R2 connection settings.
#[derive(Clone)]
pub struct StoreConfig {
    /// Bucket name.
    pub bucket_name: String,
    /// Cloudflare account identifier.
    pub account_id: String,
    /// R2 access key ID.
    pub access_key_id: String,
    /// R2 secret access key.
    pub access_key_secret: String,
    /// Public base URL objects are served from.
    pub public_url: String,
}

impl StoreConfig {
    /// Region literal R2 accepts for SigV4 signing.
    pub const REGION: &'static str = "auto";

    /// Create a new R2 store config.
    #[must_use]
    pub fn new(
        bucket_name: impl Into<String>,
        account_id: impl Into<String>,
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            account_id: account_id.into(),
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            public_url: public_url.into(),
        }
    }

    /// S3 API endpoint of the account: `https://<account_id>.r2.cloudflarestorage.com`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("bucket_name", &self.bucket_name)
            .field("account_id", &self.account_id)
            .field("access_key_id", &"[hidden]")
            .field("access_key_secret", &"[hidden]")
            .field("public_url", &self.public_url)
            .finish()
    }
}

impl From<&StorageSettings> for StoreConfig {
    fn from(settings: &StorageSettings) -> Self {
        Self::new(
            settings.bucket_name.clone(),
            settings.account_id.clone(),
            settings.access_key_id.clone(),
            settings.access_key_secret.clone(),
            settings.public_url.clone(),
        )
    }
}

/// Rules applied to every upload.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Maximum file size in megabytes; sizes at or above it are rejected.
    pub max_size_mb: u64,
    /// Accepted extensions, leading dot included, case-sensitive.
    pub allowed_extensions: HashSet<String>,
    /// Deadline for a single object store operation.
    pub timeout: Duration,
    /// Mix a per-call nonce into generated keys.
    pub key_nonce: bool,
}

impl UploadPolicy {
    /// Default max file size: 10 MB.
    pub const DEFAULT_MAX_SIZE_MB: u64 = 10;
    /// Default store operation deadline: 30 seconds.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_size_mb: Self::DEFAULT_MAX_SIZE_MB,
            allowed_extensions: Self::default_extensions(),
            timeout: Self::DEFAULT_TIMEOUT,
            key_nonce: true,
        }
    }

    /// Set maximum file size in megabytes.
    #[must_use]
    pub fn with_max_size_mb(mut self, max_size_mb: u64) -> Self {
        self.max_size_mb = max_size_mb;
        self
    }

    /// Set accepted extensions.
    #[must_use]
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the store operation deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable the key nonce.
    #[must_use]
    pub fn with_key_nonce(mut self, key_nonce: bool) -> Self {
        self.key_nonce = key_nonce;
        self
    }

    /// Default image extensions.
    #[must_use]
    pub fn default_extensions() -> HashSet<String> {
        [".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico", ".tiff"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Size limit in bytes. Files of this size or larger are rejected.
    #[must_use]
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Check if an extension (with leading dot) is accepted.
    #[must_use]
    pub fn is_extension_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions.contains(extension)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&UploadSettings> for UploadPolicy {
    fn from(settings: &UploadSettings) -> Self {
        Self::new()
            .with_max_size_mb(settings.max_size_mb)
            .with_allowed_extensions(settings.allowed_extensions.iter().cloned())
            .with_timeout(Duration::from_secs(settings.timeout_secs))
            .with_key_nonce(settings.key_nonce)
    }
}
