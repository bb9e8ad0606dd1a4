//! Object store clients.

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::OnceCell;
use opendal::{Operator, services};
use tracing::debug;

use super::config::StoreConfig;
use super::error::StoreError;

/// Put/delete-by-key access to a bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` under `key`, replacing any existing object.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError>;

    /// Remove the object stored under `key`.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// [`ObjectStore`] backed by an OpenDAL operator.
#[derive(Debug, Clone)]
pub struct OperatorStore {
    operator: Operator,
}

impl OperatorStore {
    /// Wrap an existing operator.
    #[must_use]
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    /// Build a client for a Cloudflare R2 bucket.
    ///
    /// Requests are addressed path-style, OpenDAL's default for S3. Ambient
    /// AWS config files and environment variables are ignored.
    pub fn r2(config: &StoreConfig) -> Result<Self, StoreError> {
        let builder = services::S3::default()
            .endpoint(&config.endpoint())
            .region(StoreConfig::REGION)
            .bucket(&config.bucket_name)
            .access_key_id(&config.access_key_id)
            .secret_access_key(&config.access_key_secret)
            .disable_config_load();

        let operator = Operator::new(builder)
            .map_err(|e| StoreError::configuration(e.to_string()))?
            .finish();
        Ok(Self::new(operator))
    }

    /// In-process store, for development and tests.
    pub fn memory() -> Result<Self, StoreError> {
        let operator = Operator::new(services::Memory::default())
            .map_err(|e| StoreError::configuration(e.to_string()))?
            .finish();
        Ok(Self::new(operator))
    }

    /// Underlying operator.
    #[must_use]
    pub fn operator(&self) -> &Operator {
        &self.operator
    }
}

#[async_trait]
impl ObjectStore for OperatorStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
        let result = if self.operator.info().full_capability().write_with_content_type {
            self.operator
                .write_with(key, body)
                .content_type(content_type)
                .await
        } else {
            self.operator.write(key, body).await
        };
        result
            .map(|_| ())
            .map_err(|e| StoreError::from_opendal(&e, key))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.operator
            .delete(key)
            .await
            .map_err(|e| StoreError::from_opendal(&e, key))
    }
}

/// R2 client built on first use and shared for the life of the process.
///
/// Initialisation is thread-safe; concurrent first calls build the client at
/// most once. A failed build is returned to the caller and retried on the next
/// call.
#[derive(Debug)]
pub struct LazyR2Store {
    config: StoreConfig,
    client: OnceCell<OperatorStore>,
}

impl LazyR2Store {
    /// Create a store that connects to R2 with `config` when first used.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Whether the client has been built yet.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.client.get().is_some()
    }

    /// The shared client, built on first call.
    pub fn client(&self) -> Result<&OperatorStore, StoreError> {
        self.client.get_or_try_init(|| {
            debug!(
                bucket = %self.config.bucket_name,
                endpoint = %self.config.endpoint(),
                "Initializing R2 client"
            );
            OperatorStore::r2(&self.config)
        })
    }
}

#[async_trait]
impl ObjectStore for LazyR2Store {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
        self.client()?.put(key, body, content_type).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.client()?.delete(key).await
    }
}
