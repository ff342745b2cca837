//! Storage configuration types.

use kvitto_shared::config::StorageSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
        /// Azure container name.
        container: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create S3-compatible provider (Cloudflare R2, Supabase, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create Azure Blob Storage provider.
    #[must_use]
    pub fn azure_blob(
        account: impl Into<String>,
        access_key: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
            container: container.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
        }
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } => bucket,
            Self::AzureBlob { container, .. } => container,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
        }
    }
}

/// Receipt store configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Maximum image size in bytes.
    pub max_image_size: u64,
    /// Presigned upload URL TTL in seconds (default: 900 = 15 minutes).
    pub presign_upload_ttl_secs: u64,
    /// Presigned download URL TTL in seconds (default: 3600 = 1 hour).
    pub presign_download_ttl_secs: u64,
    /// Accepted receipt image MIME types.
    pub allowed_mime_types: Vec<String>,
}

impl StorageConfig {
    /// Default max image size: 10MB.
    pub const DEFAULT_MAX_IMAGE_SIZE: u64 = 10 * 1024 * 1024;
    /// Default upload TTL: 15 minutes.
    pub const DEFAULT_UPLOAD_TTL: u64 = 900;
    /// Default download TTL: 1 hour.
    pub const DEFAULT_DOWNLOAD_TTL: u64 = 3600;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_image_size: Self::DEFAULT_MAX_IMAGE_SIZE,
            presign_upload_ttl_secs: Self::DEFAULT_UPLOAD_TTL,
            presign_download_ttl_secs: Self::DEFAULT_DOWNLOAD_TTL,
            allowed_mime_types: Self::default_mime_types(),
        }
    }

    /// Build a config from the application settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider name is unknown.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let provider = match settings.provider.as_str() {
            "s3" => StorageProvider::s3(
                &settings.endpoint,
                &settings.bucket,
                &settings.access_key,
                &settings.secret_key,
                &settings.region,
            ),
            "azblob" => StorageProvider::azure_blob(
                &settings.access_key,
                &settings.secret_key,
                &settings.bucket,
            ),
            "fs" => StorageProvider::local_fs(&settings.root),
            other => {
                return Err(StorageError::configuration(format!(
                    "unknown storage provider '{other}'"
                )));
            }
        };

        Ok(Self::new(provider).with_max_image_size(settings.max_image_size))
    }

    /// Set maximum image size.
    #[must_use]
    pub fn with_max_image_size(mut self, size: u64) -> Self {
        self.max_image_size = size;
        self
    }

    /// Set presigned upload URL TTL.
    #[must_use]
    pub fn with_upload_ttl(mut self, secs: u64) -> Self {
        self.presign_upload_ttl_secs = secs;
        self
    }

    /// Set presigned download URL TTL.
    #[must_use]
    pub fn with_download_ttl(mut self, secs: u64) -> Self {
        self.presign_download_ttl_secs = secs;
        self
    }

    /// MIME types accepted as receipt images.
    #[must_use]
    pub fn default_mime_types() -> Vec<String> {
        vec![
            "image/jpeg".to_string(),
            "image/png".to_string(),
            "image/webp".to_string(),
            "image/gif".to_string(),
            "image/heic".to_string(),
        ]
    }

    /// Check if a MIME type is allowed.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.iter().any(|t| t == mime_type)
    }
}
