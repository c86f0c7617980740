use crate::{
    domain::FileStorage,
    errors::StorageError,
};
use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_s3::{
    error::{ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    Client as S3Client,
};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing;

#[derive(Debug, Clone)]
pub struct S3FileStorage {
    client: S3Client,
    bucket_name: String,
}

impl S3FileStorage {
    pub fn new(client: S3Client, bucket_name: String) -> Self {
        tracing::info!(bucket = %bucket_name, "Initializing S3FileStorage");
        Self { client, bucket_name }
    }
}

#[async_trait]
impl FileStorage for S3FileStorage {
    /// Uploads data to S3 using PutObject. Sets Content-Type.
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: Option<String>) -> Result<(), StorageError> {
        let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());
        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, %content_type, size = data.len(), "S3: Uploading file");

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .context(format!("S3: Failed to upload object with key '{}'", key))
            .map_err(|e| StorageError::UploadFailed(format!("{:#}", e)))?;

        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, "S3: Upload successful");
        Ok(())
    }

    /// Downloads file data and its content type from S3 using GetObject.
    async fn download(&self, key: &str) -> Result<(Vec<u8>, Option<String>), StorageError> {
        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, "S3: Downloading file");

        let output = self.client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|sdk_err| {
                if let SdkError::ServiceError(service_err) = &sdk_err {
                    if service_err.err().code() == Some("NoSuchKey") {
                        tracing::warn!(s3_key = %key, bucket = %self.bucket_name, "S3: NoSuchKey error downloading file");
                        return StorageError::NotFound(key.to_string());
                    }
                }
                tracing::error!(s3_key = %key, bucket = %self.bucket_name, error = %sdk_err, "S3: Error downloading file");
                StorageError::BackendError(anyhow::Error::new(sdk_err).context(format!("S3: Failed to download object with key '{}'", key)))
            })?;

        let content_type = output.content_type().map(|s| s.to_string());
        let data = output
            .body
            .collect()
            .await
            .context(format!("S3: Failed to collect bytes for key '{}'", key))?
            .into_bytes()
            .to_vec();

        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, ?content_type, size = data.len(), "S3: Download successful");
        Ok((data, content_type))
    }

    /// Deletes an object from S3 using DeleteObject.
    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, "S3: Deleting object");

        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|sdk_err| {
                // DeleteObject succeeds for missing keys, so anything here is a real failure.
                tracing::error!(s3_key = %key, bucket = %self.bucket_name, error = %sdk_err, "S3: Error deleting object");
                StorageError::BackendError(anyhow::Error::new(sdk_err).context(format!("S3: Failed to delete object with key '{}'", key)))
            })?;

        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, "S3: Delete request successful (object might not have existed)");
        Ok(())
    }

    /// Lists all keys with ListObjectsV2, following continuation tokens.
    async fn list(&self) -> Result<Vec<String>, StorageError> {
        tracing::debug!(bucket = %self.bucket_name, "S3: Listing objects");
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let resp = self.client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .context(format!("S3: Failed to list objects in bucket '{}'", self.bucket_name))?;

            keys.extend(resp.contents().iter().filter_map(|obj| obj.key().map(str::to_string)));

            match resp.next_continuation_token() {
                Some(token) if resp.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        tracing::debug!(bucket = %self.bucket_name, count = keys.len(), "S3: Listed objects");
        Ok(keys)
    }
}

/// Content store held in process memory. Keys are listed in sorted order.
#[derive(Debug, Default)]
pub struct MemoryFileStorage {
    objects: RwLock<BTreeMap<String, (Vec<u8>, Option<String>)>>,
}

impl MemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileStorage for MemoryFileStorage {
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: Option<String>) -> Result<(), StorageError> {
        tracing::debug!(key, size = data.len(), "Memory: Storing object");
        self.objects.write().await.insert(key.to_string(), (data, content_type));
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<(Vec<u8>, Option<String>), StorageError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        tracing::debug!(key, "Memory: Removing object");
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.objects.read().await.keys().cloned().collect())
    }
}
