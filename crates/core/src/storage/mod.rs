//! Image upload gateway over Cloudflare R2 using Apache OpenDAL.
//!
//! An upload is validated, given a unique key, written to the bucket and
//! answered with the public URL the object is served from:
//!
//! ```text
//! UploadRequest ──► validate ──► object_key ──► read content ──► ObjectStore::put
//!                    (size, ext)   (md5-timestamp.ext)            (R2, path-style)
//!                                                                      │
//!                                            UploadedImage { url, key } ◄┘
//! ```
//!
//! The R2 client is built once, on first use, and shared by every call
//! (see [`LazyR2Store`]). Every store operation runs under the configured
//! deadline and reports failures as typed errors.

mod config;
mod error;
mod key;
mod service;
mod store;
mod validation;

pub use config::{StoreConfig, UploadPolicy};
pub use error::{GatewayError, StoreError, ValidationError};
pub use key::{KeyGenerator, TIMESTAMP_FORMAT, object_key, object_key_with_nonce};
pub use service::{UploadGateway, UploadRequest, UploadedImage};
pub use store::{LazyR2Store, ObjectStore, OperatorStore};
pub use validation::{BYTES_PER_MB, format_megabytes, split_extension, validate};
