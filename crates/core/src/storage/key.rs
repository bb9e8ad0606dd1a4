//! Storage key derivation.
//!
//! Keys look like `<md5 hex>-<YYYYMMDDHHMMSS><ext>`, e.g.
//! `5d41402abc4b2a76b9719d911017c592-20260118093015.png`.

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use uuid::Uuid;

use super::validation::split_extension;

/// `chrono` format of the timestamp component.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Derive the key for `file_name` uploaded at `at`.
///
/// The hash covers the base name only, so the result is fully determined by
/// the base name, the extension and the second of `at`.
#[must_use]
pub fn object_key(file_name: &str, at: DateTime<Utc>) -> String {
    object_key_with_nonce(file_name, at, &[])
}

/// Like [`object_key`], with `nonce` appended to the hashed base name.
#[must_use]
pub fn object_key_with_nonce(file_name: &str, at: DateTime<Utc>, nonce: &[u8]) -> String {
    let (base, extension) = split_extension(file_name);

    let mut hasher = Md5::new();
    hasher.update(base.as_bytes());
    hasher.update(nonce);
    let hash = hex::encode(hasher.finalize());

    format!("{hash}-{}{extension}", at.format(TIMESTAMP_FORMAT))
}

/// Generates keys at call time.
#[derive(Debug, Clone, Copy)]
pub struct KeyGenerator {
    nonce: bool,
}

impl KeyGenerator {
    /// Create a generator. With `nonce` set, every key mixes in 16 random
    /// bytes, so two uploads of the same name within one second get distinct
    /// keys.
    #[must_use]
    pub const fn new(nonce: bool) -> Self {
        Self { nonce }
    }

    /// Generate a key for `file_name` using the current UTC time.
    #[must_use]
    pub fn generate(&self, file_name: &str) -> String {
        let now = Utc::now();
        if self.nonce {
            object_key_with_nonce(file_name, now, Uuid::new_v4().as_bytes())
        } else {
            object_key(file_name, now)
        }
    }
}
