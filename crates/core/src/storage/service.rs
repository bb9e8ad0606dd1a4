//! Upload gateway implementation.

use std::future::Future;
use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::info;

use super::config::{StoreConfig, UploadPolicy};
use super::error::{GatewayError, StoreError, ValidationError};
use super::key::KeyGenerator;
use super::store::{LazyR2Store, ObjectStore};
use super::validation::validate;

/// A file handed to [`UploadGateway::upload`].
#[derive(Debug)]
pub struct UploadRequest<R> {
    /// Original file name; its extension is kept in the stored key.
    pub file_name: String,
    /// Declared size in bytes.
    pub size_bytes: u64,
    /// File content.
    pub content: R,
}

impl<R> UploadRequest<R> {
    /// Create an upload request.
    #[must_use]
    pub fn new(file_name: impl Into<String>, size_bytes: u64, content: R) -> Self {
        Self {
            file_name: file_name.into(),
            size_bytes,
            content,
        }
    }
}

impl UploadRequest<Cursor<Bytes>> {
    /// Create a request for content already held in memory.
    #[must_use]
    pub fn from_bytes(file_name: impl Into<String>, content: Bytes) -> Self {
        let size_bytes = content.len() as u64;
        Self::new(file_name, size_bytes, Cursor::new(content))
    }
}

/// A stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Public URL the image is served from.
    pub url: String,
    /// Key of the object in the bucket.
    pub key: String,
}

/// Uploads images to an object store and deletes them again.
pub struct UploadGateway {
    store: Arc<dyn ObjectStore>,
    policy: UploadPolicy,
    public_url: String,
    keys: KeyGenerator,
}

impl std::fmt::Debug for UploadGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadGateway")
            .field("policy", &self.policy)
            .field("public_url", &self.public_url)
            .finish_non_exhaustive()
    }
}

impl UploadGateway {
    /// Create a gateway over `store`. Uploaded objects are reported as
    /// `<public_url>/<key>`.
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        policy: UploadPolicy,
        public_url: impl Into<String>,
    ) -> Self {
        let keys = KeyGenerator::new(policy.key_nonce);
        Self {
            store,
            policy,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            keys,
        }
    }

    /// Create a gateway over the Cloudflare R2 bucket in `config`.
    ///
    /// The R2 client is built on the first upload or delete and reused after.
    #[must_use]
    pub fn r2(config: StoreConfig, policy: UploadPolicy) -> Self {
        let public_url = config.public_url.clone();
        Self::new(Arc::new(LazyR2Store::new(config)), policy, public_url)
    }

    /// Get the upload policy.
    #[must_use]
    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Public URL of the object stored under `key`.
    #[must_use]
    pub fn public_url_for(&self, key: &str) -> String {
        format!("{}/{key}", self.public_url)
    }

    /// Upload an image.
    ///
    /// Validation happens before anything is read or sent, so rejected files
    /// never reach the store. The content stream is consumed and dropped on
    /// every path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the declared or actual size is at or above the limit
    /// - the extension is not allowed
    /// - the content cannot be read
    /// - the store fails or misses the deadline
    pub async fn upload<R>(&self, request: UploadRequest<R>) -> Result<UploadedImage, GatewayError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let UploadRequest {
            file_name,
            size_bytes,
            content,
        } = request;

        validate(&file_name, size_bytes, &self.policy)?;

        let key = self.keys.generate(&file_name);
        let body = self.read_content(content, size_bytes).await?;
        let bytes = body.len();
        let content_type = mime_guess::from_path(&file_name).first_or_octet_stream();

        self.with_deadline(self.store.put(&key, body, content_type.essence_str()))
            .await?;

        info!(
            file_name = %file_name,
            key = %key,
            bytes,
            "Image uploaded"
        );

        Ok(UploadedImage {
            url: self.public_url_for(&key),
            key,
        })
    }

    /// Delete a previously uploaded image.
    ///
    /// Deleting a key that does not exist succeeds when the store reports it
    /// as success, which R2 does.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or names a directory, or if the
    /// store fails or misses the deadline.
    pub async fn delete(&self, key: &str) -> Result<(), GatewayError> {
        if key.is_empty() || key.ends_with('/') {
            return Err(ValidationError::InvalidKey(key.to_string()).into());
        }

        self.with_deadline(self.store.delete(key)).await?;

        info!(key = %key, "Image deleted");
        Ok(())
    }

    /// Read the whole content, stopping at the size limit.
    async fn read_content<R>(&self, content: R, size_hint: u64) -> Result<Bytes, GatewayError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let limit = self.policy.max_size_bytes();
        let mut buf = Vec::with_capacity(usize::try_from(size_hint.min(limit)).unwrap_or(0));
        content.take(limit).read_to_end(&mut buf).await?;

        // The declared size can understate the stream.
        let read = buf.len() as u64;
        if read >= limit {
            return Err(ValidationError::TooLarge {
                size_bytes: read,
                max_mb: self.policy.max_size_mb,
            }
            .into());
        }

        Ok(Bytes::from(buf))
    }

    async fn with_deadline<F>(&self, operation: F) -> Result<(), StoreError>
    where
        F: Future<Output = Result<(), StoreError>>,
    {
        tokio::time::timeout(self.policy.timeout, operation)
            .await
            .map_err(|_| StoreError::Timeout(self.policy.timeout))?
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
