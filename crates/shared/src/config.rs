//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Object store (Cloudflare R2) configuration.
    pub storage: StorageSettings,
    /// Image upload policy.
    #[serde(default)]
    pub upload: UploadSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Cloudflare R2 bucket configuration.
///
/// Credentials are treated as secrets: they are hidden from `Debug` output and
/// must never be logged.
#[derive(Clone, Deserialize)]
pub struct StorageSettings {
    /// Bucket that receives uploaded images.
    pub bucket_name: String,
    /// Cloudflare account identifier, used to derive the R2 endpoint.
    pub account_id: String,
    /// R2 access key ID.
    pub access_key_id: String,
    /// R2 secret access key.
    pub access_key_secret: String,
    /// Public base URL the bucket is served from, e.g. `https://pub-<id>.r2.dev`.
    pub public_url: String,
}

impl std::fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSettings")
            .field("bucket_name", &self.bucket_name)
            .field("account_id", &self.account_id)
            .field("access_key_id", &"[hidden]")
            .field("access_key_secret", &"[hidden]")
            .field("public_url", &self.public_url)
            .finish()
    }
}

/// Upload policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// Maximum accepted file size in megabytes (exclusive).
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
    /// Accepted file extensions, including the leading dot. Case-sensitive.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Deadline for a single object store operation, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Mix a random nonce into generated keys so same-name uploads within one
    /// second do not overwrite each other.
    #[serde(default = "default_key_nonce")]
    pub key_nonce: bool,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_size_mb: default_max_size_mb(),
            allowed_extensions: default_allowed_extensions(),
            timeout_secs: default_timeout_secs(),
            key_nonce: default_key_nonce(),
        }
    }
}

fn default_max_size_mb() -> u64 {
    10
}

fn default_allowed_extensions() -> Vec<String> {
    [".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico", ".tiff"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_key_nonce() -> bool {
    true
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, lowest precedence first: `config/default.toml`,
    /// `config/{RUN_MODE}.toml`, then `INKPOT__*` environment variables
    /// (`INKPOT__UPLOAD__ALLOWED_EXTENSIONS` takes a comma-separated list).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("INKPOT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("upload.allowed_extensions")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
