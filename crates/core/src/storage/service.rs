//! Receipt store implementation using Apache OpenDAL.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use opendal::{ErrorKind, Operator, services};
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Presigned URL for upload or download.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use (PUT for upload, GET for download).
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
    /// Required headers for the request.
    pub headers: HashMap<String, String>,
}

/// Request to generate an upload URL for a receipt image.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Owner tag the receipt belongs to.
    pub owner: String,
    /// Expense record the image documents.
    pub record_id: Uuid,
    /// Original filename.
    pub filename: String,
    /// Content type (MIME type).
    pub content_type: String,
    /// Image size in bytes.
    pub image_size: u64,
}

/// Metadata about a stored receipt image.
#[derive(Debug, Clone)]
pub struct ReceiptMetadata {
    /// Storage key.
    pub storage_key: String,
    /// Image size in bytes.
    pub image_size: u64,
    /// Content type.
    pub content_type: Option<String>,
}

/// Object store for receipt images.
pub struct ReceiptStore {
    operator: Operator,
    config: StorageConfig,
}

impl ReceiptStore {
    /// Create a new receipt store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
        }
    }

    /// Validate upload request against config constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if image size or MIME type is invalid.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_image_size {
            return Err(StorageError::image_too_large(
                size,
                self.config.max_image_size,
            ));
        }

        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }

        Ok(())
    }

    /// Generate storage key for a receipt image.
    ///
    /// Format: `{owner}/{record_id}/{sanitized_filename}`
    #[must_use]
    pub fn generate_storage_key(req: &UploadRequest) -> String {
        format!(
            "{}/{}/{}",
            sanitize_path_segment(&req.owner),
            req.record_id,
            sanitize_path_segment(&req.filename)
        )
    }

    /// Generate presigned URL for upload.
    ///
    /// # Errors
    ///
    /// Returns an error if presigning is not supported or fails.
    pub async fn presign_upload(&self, req: &UploadRequest) -> Result<PresignedUrl, StorageError> {
        self.validate_upload(&req.content_type, req.image_size)?;

        let key = Self::generate_storage_key(req);
        let ttl = Duration::from_secs(self.config.presign_upload_ttl_secs);

        let presigned = self
            .operator
            .presign_write(&key, ttl)
            .await
            .map_err(StorageError::from)?;

        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), req.content_type.clone());

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: Utc::now()
                + chrono::Duration::seconds(
                    i64::try_from(self.config.presign_upload_ttl_secs).unwrap_or(i64::MAX),
                ),
            headers,
        })
    }

    /// Generate presigned URL for download.
    ///
    /// # Errors
    ///
    /// Returns an error if presigning is not supported or fails.
    pub async fn presign_download(&self, key: &str) -> Result<PresignedUrl, StorageError> {
        let ttl = Duration::from_secs(self.config.presign_download_ttl_secs);

        let presigned = self
            .operator
            .presign_read(key, ttl)
            .await
            .map_err(StorageError::from)?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: Utc::now()
                + chrono::Duration::seconds(
                    i64::try_from(self.config.presign_download_ttl_secs).unwrap_or(i64::MAX),
                ),
            headers: HashMap::new(),
        })
    }

    /// Read a stored receipt image, for vision analysis.
    ///
    /// # Errors
    ///
    /// Returns an error if the image does not exist or cannot be read.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let buffer = self.operator.read(key).await.map_err(StorageError::from)?;
        Ok(buffer.to_vec())
    }

    /// Verify that an image exists in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the image does not exist or cannot be accessed.
    pub async fn verify_upload(&self, key: &str) -> Result<ReceiptMetadata, StorageError> {
        let meta = self.operator.stat(key).await.map_err(StorageError::from)?;

        Ok(ReceiptMetadata {
            storage_key: key.to_string(),
            image_size: meta.content_length(),
            content_type: meta.content_type().map(String::from),
        })
    }

    /// Delete an image from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Check if an image exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(_) => false,
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Sanitize an owner tag or filename for use as a storage key segment.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize_path_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    // Presigned URL TTLs come straight from the config builder.
    proptest! {
        #[test]
        fn prop_presigned_url_ttl_within_bounds(
            upload_ttl in 60u64..3600,
            download_ttl in 60u64..7200,
        ) {
            let config = StorageConfig::new(StorageProvider::local_fs("./test"))
                .with_upload_ttl(upload_ttl)
                .with_download_ttl(download_ttl);

            prop_assert_eq!(config.presign_upload_ttl_secs, upload_ttl);
            prop_assert_eq!(config.presign_download_ttl_secs, download_ttl);
        }
    }

    // Only MIME types in the allowed list pass validation.
    proptest! {
        #[test]
        fn prop_mime_type_validation(mime_type in "[a-z]+/[a-z0-9-]+") {
            let config = StorageConfig::new(StorageProvider::local_fs("./test"));
            let store = ReceiptStore::from_config(config.clone())
                .expect("should create store");

            let result = store.validate_upload(&mime_type, 1024);
            let is_allowed = config.is_mime_type_allowed(&mime_type);

            if is_allowed {
                prop_assert!(result.is_ok(), "Expected Ok for allowed MIME type");
            } else {
                let is_invalid_mime = matches!(result, Err(StorageError::InvalidMimeType { .. }));
                prop_assert!(is_invalid_mime, "Expected InvalidMimeType error");
            }
        }
    }

    // Any image over the configured limit is rejected.
    proptest! {
        #[test]
        fn prop_image_size_validation(
            max_size in 1024u64..10_000_000,
            image_size in 0u64..20_000_000,
        ) {
            let config = StorageConfig::new(StorageProvider::local_fs("./test"))
                .with_max_image_size(max_size);
            let store = ReceiptStore::from_config(config)
                .expect("should create store");

            let result = store.validate_upload("image/jpeg", image_size);

            if image_size <= max_size {
                prop_assert!(result.is_ok(), "Expected Ok for valid image size");
            } else {
                let is_too_large = matches!(result, Err(StorageError::ImageTooLarge { .. }));
                prop_assert!(is_too_large, "Expected ImageTooLarge error");
            }
        }
    }

    // Storage keys always split into owner/record_id/filename.
    proptest! {
        #[test]
        fn prop_storage_key_format(
            owner in "[a-zA-Z0-9_-]{1,30}",
            filename in "[a-zA-Z0-9_-]{1,50}\\.[a-z]{2,4}",
        ) {
            let record_id = Uuid::new_v4();

            let req = UploadRequest {
                owner: owner.clone(),
                record_id,
                filename: filename.clone(),
                content_type: "image/jpeg".to_string(),
                image_size: 1024,
            };

            let key = ReceiptStore::generate_storage_key(&req);

            let parts: Vec<&str> = key.split('/').collect();
            prop_assert_eq!(parts.len(), 3);
            prop_assert_eq!(parts[0], owner);
            prop_assert_eq!(parts[1], record_id.to_string());
            prop_assert_eq!(parts[2], filename);
        }
    }

    // Sanitized segments only contain safe characters.
    proptest! {
        #[test]
        fn prop_sanitized_segment_safe_chars(segment in ".*") {
            let sanitized = sanitize_path_segment(&segment);

            for c in sanitized.chars() {
                let is_safe = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
                prop_assert!(is_safe, "Unexpected character in sanitized segment: {}", c);
            }
        }
    }
}
