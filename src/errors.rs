use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

// --- Domain/Infrastructure Errors ---

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Meme not found with ID: {0}")]
    NotFound(i64),

    #[error("Database backend error: {0}")]
    BackendError(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File upload failed: {0}")]
    UploadFailed(String),

    #[error("File not found with key: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    BackendError(#[from] anyhow::Error),
}

/// Image bytes that do not decode as a supported image.
#[derive(Error, Debug)]
#[error("Uploaded file is not an image: {reason}")]
pub struct InvalidImage {
    pub reason: String,
}

// --- Lifecycle Errors ---

#[derive(Error, Debug)]
pub enum MemeError {
    #[error(transparent)]
    InvalidImage(#[from] InvalidImage),

    #[error("Meme not found with ID: {0}")]
    NotFound(i64),

    #[error("No memes at offset {offset}")]
    EmptyPage { offset: u32 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to store image '{key}'")]
    StorageWriteFailed {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to delete image '{key}'")]
    StorageDeleteFailed {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Metadata repository error")]
    Repository(#[source] RepoError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for MemeError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(id) => MemeError::NotFound(id),
            e => MemeError::Repository(e),
        }
    }
}

// --- Web Layer Error ---

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Error processing multipart form data: {0}")]
    MultipartError(#[from] axum::extract::multipart::MultipartError),

    #[error("Invalid API Key")]
    Unauthorized,

    #[error(transparent)]
    Meme(#[from] MemeError),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            // 4xx Client Errors
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::MultipartError(e) => {
                (e.status(), format!("Invalid multipart form data: {}", e.body_text()))
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid API Key".to_string()),
            AppError::Meme(MemeError::InvalidImage(_)) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Uploaded file is not an image".to_string(),
            ),
            AppError::Meme(MemeError::NotFound(_) | MemeError::EmptyPage { .. }) => {
                (StatusCode::NOT_FOUND, "Meme not found".to_string())
            }
            AppError::Meme(MemeError::InvalidInput(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),

            // 5xx Server Errors
            AppError::Meme(MemeError::StorageWriteFailed { key, source }) => {
                tracing::error!(s3_key = %key, error.source = ?source, "Storage write failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store image".to_string())
            }
            AppError::Meme(MemeError::StorageDeleteFailed { key, source }) => {
                tracing::error!(s3_key = %key, error.source = ?source, "Storage delete failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete image".to_string())
            }
            AppError::Meme(MemeError::Repository(e)) => {
                tracing::error!(error.source = ?e, "Repository error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database operation failed".to_string())
            }
            AppError::Meme(MemeError::Internal(msg)) => {
                tracing::error!("Lifecycle internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal server error occurred".to_string())
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal server error occurred".to_string())
            }
        }
    }
}

// --- Axum Response Implementation ---

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();

        if status.is_server_error() {
            tracing::error!(error.message = %detail, error.detail = %self, "Responding with error");
        } else {
            tracing::debug!(error.message = %detail, error.status = %status, "Responding with client error");
        }

        let body = Json(serde_json::json!({ "detail": detail }));
        (status, body).into_response()
    }
}
