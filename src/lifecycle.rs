//! Meme lifecycle: keeps the content store and the metadata repository in step.
//!
//! The two stores share no transaction, so consistency comes from ordering alone:
//!
//! * create: validate, write object, insert row
//! * update: validate, delete old object, write new object, update row
//! * delete: delete object, delete row
//!
//! A row is never inserted before its object exists and never deleted before its
//! object is gone. Nothing is rolled back across stores. The remaining windows
//! (object written but insert failed; old object deleted but new write failed) are
//! logged with the affected key for out-of-band reconciliation.

use std::sync::Arc;

use crate::domain::{FileStorage, MemeRepository};
use crate::errors::{MemeError, RepoError};
use crate::models::{ImageUpload, Meme, MemePatch, NewMeme};
use crate::validation::{validate_image, ValidatedImage};

/// Maps (title, filename) to object keys and object keys to public URLs.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    bucket: String,
    url_base: String,
}

impl StorageLayout {
    pub fn new(bucket: impl Into<String>, url_base: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            url_base: url_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Layout with the default `http://{bucket}` URL base.
    pub fn for_bucket(bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        let url_base = format!("http://{}", bucket);
        Self::new(bucket, url_base)
    }

    /// `{title}_{filename}`. Identical pairs map to the same key, so a later
    /// upload replaces the earlier object.
    pub fn object_key(&self, title: &str, filename: &str) -> String {
        format!("{}_{}", title, filename)
    }

    pub fn image_url(&self, key: &str) -> String {
        format!("{}/{}", self.url_base, key)
    }

    /// Recovers the object key from a stored `image_url`.
    ///
    /// Returns `None` for URLs outside the configured base. Titles may contain
    /// `/`, so the key cannot be guessed from the tail of a foreign URL.
    pub fn key_from_url(&self, image_url: &str) -> Option<String> {
        let Some(key) = image_url
            .strip_prefix(self.url_base.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            tracing::warn!(image_url, url_base = %self.url_base,
                "Image URL is outside the configured base; object key unknown");
            return None;
        };
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }
}

/// An upload that passed validation and is ready to be written.
struct PreparedImage {
    filename: String,
    content_type: String,
    data: Vec<u8>,
}

/// Sole writer of meme rows and meme objects.
#[derive(Clone)]
pub struct MemeLifecycleManager {
    repo: Arc<dyn MemeRepository>,
    storage: Arc<dyn FileStorage>,
    layout: StorageLayout,
}

impl MemeLifecycleManager {
    pub fn new(
        repo: Arc<dyn MemeRepository>,
        storage: Arc<dyn FileStorage>,
        layout: StorageLayout,
    ) -> Self {
        tracing::info!(bucket = %layout.bucket, "Initializing MemeLifecycleManager");
        Self { repo, storage, layout }
    }

    /// Stores the image, then inserts the row.
    pub async fn create(
        &self,
        title: String,
        description: String,
        upload: ImageUpload,
    ) -> Result<Meme, MemeError> {
        if title.trim().is_empty() {
            return Err(MemeError::InvalidInput("title cannot be empty".to_string()));
        }

        let image = prepare(upload).await?;
        let key = self.layout.object_key(&title, &image.filename);

        self.write_object(&key, image).await?;
        let image_url = self.layout.image_url(&key);

        let new_meme = NewMeme {
            title,
            description,
            image_url,
        };
        let meme = self.repo.insert(new_meme).await.map_err(|e| {
            tracing::error!(s3_key = %key, bucket = %self.layout.bucket, error = %e,
                "Row insert failed after image upload; object is orphaned");
            MemeError::from(e)
        })?;

        tracing::info!(meme_id = meme.id, s3_key = %key, "Meme created");
        Ok(meme)
    }

    /// Applies `patch` to an existing meme.
    ///
    /// A new image is validated before anything is touched. The old object is
    /// deleted before the new one is written; if that delete fails the update
    /// is aborted and nothing changes.
    pub async fn update(&self, id: i64, patch: MemePatch) -> Result<Meme, MemeError> {
        let mut meme = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(MemeError::NotFound(id))?;

        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(MemeError::InvalidInput("title cannot be empty".to_string()));
            }
        }

        let MemePatch {
            title,
            description,
            image,
        } = patch;

        let image = match image {
            Some(upload) => Some(prepare(upload).await?),
            None => None,
        };

        if let Some(image) = image {
            if let Some(old_key) = self.layout.key_from_url(&meme.image_url) {
                self.delete_object(&old_key).await?;
            }

            let key_title = title.as_deref().unwrap_or(&meme.title);
            let key = self.layout.object_key(key_title, &image.filename);
            self.write_object(&key, image).await.inspect_err(|_| {
                tracing::error!(meme_id = id, s3_key = %key, old_image_url = %meme.image_url,
                    "Image write failed after old image was deleted; row references a missing object");
            })?;
            meme.image_url = self.layout.image_url(&key);
        }

        if let Some(title) = title {
            meme.title = title;
        }
        if let Some(description) = description {
            meme.description = description;
        }

        self.repo.update(&meme).await.map_err(|e| {
            tracing::error!(meme_id = id, image_url = %meme.image_url, error = %e,
                "Row update failed; stored image may be out of step with the row");
            MemeError::from(e)
        })?;

        tracing::info!(meme_id = id, "Meme updated");
        Ok(meme)
    }

    /// Deletes the image, then the row. Returns the row's last values.
    pub async fn delete(&self, id: i64) -> Result<Meme, MemeError> {
        let meme = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(MemeError::NotFound(id))?;

        if let Some(key) = self.layout.key_from_url(&meme.image_url) {
            self.delete_object(&key).await?;
        }

        self.repo.delete(id).await.map_err(|e| match e {
            RepoError::NotFound(_) => MemeError::NotFound(id),
            e => {
                tracing::error!(meme_id = id, error = %e, "Row delete failed after image was deleted");
                MemeError::Repository(e)
            }
        })?;

        tracing::info!(meme_id = id, "Meme deleted");
        Ok(meme)
    }

    async fn write_object(&self, key: &str, image: PreparedImage) -> Result<(), MemeError> {
        self.storage
            .upload(key, image.data, Some(image.content_type))
            .await
            .map_err(|source| MemeError::StorageWriteFailed {
                key: key.to_string(),
                source,
            })
    }

    async fn delete_object(&self, key: &str) -> Result<(), MemeError> {
        self.storage
            .delete(key)
            .await
            .map_err(|source| MemeError::StorageDeleteFailed {
                key: key.to_string(),
                source,
            })
    }
}

/// Validates off the async runtime and settles the filename and content type.
async fn prepare(upload: ImageUpload) -> Result<PreparedImage, MemeError> {
    let ImageUpload {
        filename,
        content_type,
        data,
    } = upload;

    let (validated, data) = tokio::task::spawn_blocking(move || {
        let result = validate_image(&data);
        (result, data)
    })
    .await
    .map_err(validation_task_failed)?;
    let validated: ValidatedImage = validated?;

    let filename = filename
        .as_deref()
        .map(base_name)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("upload.{}", validated.extension()));

    let content_type = content_type
        .filter(|ct| !ct.is_empty())
        .or_else(|| mime_guess::from_path(&filename).first_raw().map(str::to_string))
        .unwrap_or_else(|| validated.mime_type().to_string());

    Ok(PreparedImage {
        filename,
        content_type,
        data,
    })
}

// A panicked or cancelled decoder is a server fault, not a bad upload.
fn validation_task_failed(err: tokio::task::JoinError) -> MemeError {
    MemeError::Internal(format!("image validation task failed: {}", err))
}

// Client-supplied names may carry directories.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim()
}
