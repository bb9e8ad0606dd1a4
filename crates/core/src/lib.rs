//! Core upload logic for Inkpot.
//!
//! This crate contains the image upload gateway with ZERO web dependencies.
//! Validation rules, key derivation and object store access live here.
//!
//! # Modules
//!
//! - `storage` - Upload gateway over Cloudflare R2 (S3-compatible)

pub mod storage;
