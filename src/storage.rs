//! Object storage access for stored files (S3-compatible, e.g. MinIO).

use crate::config::get_config;
use bytes::Bytes;
use object_store::{ObjectStore, aws::AmazonS3Builder, path::Path as ObjectPath};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors that escape the storage client.
///
/// Storage-level failures (missing object, denied access, transport errors) are not errors
/// here: [`StorageClient::download`] reports them as `Ok(false)`.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be configured from the supplied settings.
    #[error("Invalid storage configuration: {0}")]
    Configuration(#[source] object_store::Error),
    /// Writing the downloaded object to local disk failed.
    #[error("Failed to write downloaded object: {0}")]
    Io(#[from] std::io::Error),
}

/// Thin download-by-key wrapper over an [`ObjectStore`].
#[derive(Clone)]
pub struct StorageClient {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl StorageClient {
    /// Build an S3 client using configuration derived from the environment.
    pub fn new() -> Result<Self, StorageError> {
        let config = get_config();
        let endpoint = endpoint_url(&config.storage_endpoint, config.storage_secure);
        let store = AmazonS3Builder::new()
            .with_endpoint(&endpoint)
            .with_region(&config.storage_region)
            .with_bucket_name(&config.storage_bucket)
            .with_access_key_id(&config.storage_access_key)
            .with_secret_access_key(&config.storage_secret_key)
            .with_allow_http(!config.storage_secure)
            .build()
            .map_err(StorageError::Configuration)?;
        tracing::debug!(
            endpoint = %endpoint,
            bucket = %config.storage_bucket,
            "Initialized object storage client"
        );
        Ok(Self::from_store(Arc::new(store), config.storage_bucket.clone()))
    }

    /// Wrap an existing store.
    pub fn from_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Download `object_name` into `destination`.
    ///
    /// Returns `Ok(false)` when the store cannot deliver the object; local I/O failures
    /// while writing `destination` are returned as errors.
    pub async fn download(
        &self,
        object_name: &str,
        destination: &Path,
    ) -> Result<bool, StorageError> {
        let bytes = match self.fetch(object_name).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(
                    bucket = %self.bucket,
                    object_name,
                    error = %error,
                    "Error downloading file"
                );
                return Ok(false);
            }
        };

        tokio::fs::write(destination, &bytes).await?;
        tracing::debug!(
            bucket = %self.bucket,
            object_name,
            bytes = bytes.len(),
            "Object downloaded"
        );
        Ok(true)
    }

    async fn fetch(&self, object_name: &str) -> object_store::Result<Bytes> {
        let location = ObjectPath::from(object_name);
        self.store.get(&location).await?.bytes().await
    }
}

fn endpoint_url(endpoint: &str, secure: bool) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        let scheme = if secure { "https" } else { "http" };
        format!("{scheme}://{endpoint}")
    }
}
