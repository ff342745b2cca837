//! Receipt image storage using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem (development only)
//!
//! Images are never proxied through the API: clients upload and download via
//! presigned URLs, and records hold only the storage key.

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{PresignedUrl, ReceiptMetadata, ReceiptStore, UploadRequest};
