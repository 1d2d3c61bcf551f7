//! Stored-file records kept in MongoDB.

use crate::config::get_config;
use async_trait::async_trait;
use mongodb::{Client, Collection, bson::doc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a file was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilePurpose {
    /// Uploaded for retrieval.
    Retrieval,
    /// Any purpose this service does not know about.
    #[serde(other)]
    Unknown,
}

/// Persisted record describing a stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDocument {
    /// Storage key of the object.
    #[serde(default)]
    pub object_name: Option<String>,
    /// Why the file was stored.
    #[serde(default)]
    pub purpose: Option<FilePurpose>,
    /// Size in bytes.
    #[serde(default)]
    pub bytes: Option<i64>,
    /// Original filename.
    #[serde(default)]
    pub file_name: String,
    /// Public identifier of the file.
    #[serde(default)]
    pub file_id: String,
}

impl FileDocument {
    /// Storage key exactly as stored, when present and non-empty.
    pub fn storage_key(&self) -> Option<&str> {
        self.object_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Errors raised while reading file records.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The MongoDB driver reported a failure.
    #[error("MongoDB request failed: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// Read-only access to stored-file records.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Look up a record by identifier.
    async fn find_by_id(&self, file_id: &str) -> Result<Option<FileDocument>, RepositoryError>;
}

/// [`FileRepository`] backed by a MongoDB collection.
pub struct MongoFileRepository {
    collection: Collection<FileDocument>,
}

impl MongoFileRepository {
    /// Connect using configuration derived from the environment.
    pub async fn connect() -> Result<Self, RepositoryError> {
        let config = get_config();
        let client = Client::with_uri_str(&config.mongo_database_url).await?;
        let collection = client
            .database(&config.mongo_database_name)
            .collection::<FileDocument>(&config.mongo_collection_name);
        tracing::debug!(
            database = %config.mongo_database_name,
            collection = %config.mongo_collection_name,
            "Initialized MongoDB file repository"
        );
        Ok(Self { collection })
    }
}

#[async_trait]
impl FileRepository for MongoFileRepository {
    async fn find_by_id(&self, file_id: &str) -> Result<Option<FileDocument>, RepositoryError> {
        let document = self.collection.find_one(doc! { "_id": file_id }).await?;
        tracing::debug!(file_id, found = document.is_some(), "File record lookup");
        Ok(document)
    }
}
