use crate::errors::{RepoError, StorageError};
use crate::models::{Meme, NewMeme};
use async_trait::async_trait;

/// Trait defining operations for storing and retrieving Meme metadata.
///
/// Every write commits before returning.
#[async_trait]
pub trait MemeRepository: Send + Sync + 'static { // Send+Sync+'static required for Arc<dyn>
    /// Inserts a new row and returns it with its store-assigned id.
    async fn insert(&self, meme: NewMeme) -> Result<Meme, RepoError>;

    /// Retrieves a meme's metadata by its ID.
    /// Returns Ok(None) if the meme is not found.
    async fn get_by_id(&self, id: i64) -> Result<Option<Meme>, RepoError>;

    /// Lists rows in primary-key order.
    async fn list(&self, offset: u32, limit: u32) -> Result<Vec<Meme>, RepoError>;

    /// Overwrites title, description and image_url of an existing row.
    /// Fails with `RepoError::NotFound` if the row has gone away.
    async fn update(&self, meme: &Meme) -> Result<(), RepoError>;

    /// Removes a row. Fails with `RepoError::NotFound` if no row was deleted.
    async fn delete(&self, id: i64) -> Result<(), RepoError>;
}

/// Trait defining operations for storing and retrieving file data (meme images).
#[async_trait]
pub trait FileStorage: Send + Sync + 'static {
    /// Uploads file data to the storage backend, replacing any object under `key`.
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: Option<String>) -> Result<(), StorageError>;

    /// Downloads an object and its content type.
    async fn download(&self, key: &str) -> Result<(Vec<u8>, Option<String>), StorageError>;

    /// Removes an object. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Lists every object key in the bucket.
    async fn list(&self) -> Result<Vec<String>, StorageError>;
}

/// Verifies the credential presented to the private API.
pub trait CredentialVerifier: Send + Sync + 'static {
    fn verify(&self, token: &str) -> bool;
}
