//! Cloudflare R2 storage client.
//!
//! This crate provides:
//! - File upload to R2 behind the [`ObjectStore`] seam
//! - Presigned GET URLs behind the [`UrlSigner`] seam
//! - Bounded-retry signing of a generation's three assets

pub mod client;
pub mod error;
pub mod operations;
pub mod signer;

pub use client::{R2Client, R2Config, MAX_PRESIGN_EXPIRY};
pub use error::{StorageError, StorageResult};
pub use operations::{upload_generation_assets, ObjectStore};
pub use signer::{sign_triplet, sign_with_retry, SigningPolicy, UrlSigner};
