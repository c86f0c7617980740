use crate::{
    errors::AppError,
    models::{ImageUpload, Meme, MemePatch, Pagination},
    AppState,
};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        FromRequest, Multipart, Path, Query, Request, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing;

/// Name of the multipart part carrying the image.
pub const FILE_FIELD: &str = "file";

#[derive(Deserialize, Debug, Default)]
pub struct CreateParams {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateParams {
    pub title: Option<String>,
    pub description: Option<String>,
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// --- Public (read-only) ---

pub async fn list_memes(
    State(state): State<Arc<AppState>>,
    pagination: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<Meme>>, AppError> {
    let Query(pagination) = pagination.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    tracing::debug!(skip = pagination.skip, limit = pagination.limit, "Listing memes via handler");
    let memes = state.reader.list(pagination.skip, pagination.limit).await?;
    Ok(Json(memes))
}

pub async fn get_meme(
    State(state): State<Arc<AppState>>,
    meme_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Meme>, AppError> {
    let Path(meme_id) = meme_id.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    tracing::debug!(meme_id, "Fetching meme details via handler");
    let meme = state.reader.get(meme_id).await?;
    Ok(Json(meme))
}

// --- Private (authenticated write) ---

pub async fn create_meme(
    State(state): State<Arc<AppState>>,
    params: Result<Query<CreateParams>, QueryRejection>,
    request: Request,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let title = params
        .title
        .ok_or_else(|| AppError::InvalidInput("Missing query parameter: title".to_string()))?;
    let description = params
        .description
        .ok_or_else(|| AppError::InvalidInput("Missing query parameter: description".to_string()))?;

    let upload = match multipart_body(request).await? {
        Some(multipart) => read_image_field(multipart).await?,
        None => None,
    }
    .ok_or_else(|| AppError::InvalidInput(format!("Missing form field: {}", FILE_FIELD)))?;

    let meme = state.lifecycle.create(title, description, upload).await?;

    tracing::info!(meme_id = meme.id, "Meme created successfully via handler");
    Ok((StatusCode::CREATED, Json(meme)))
}

pub async fn update_meme(
    State(state): State<Arc<AppState>>,
    meme_id: Result<Path<i64>, PathRejection>,
    params: Result<Query<UpdateParams>, QueryRejection>,
    request: Request,
) -> Result<Json<Meme>, AppError> {
    let Path(meme_id) = meme_id.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let Query(params) = params.map_err(|e| AppError::InvalidInput(e.body_text()))?;

    let image = match multipart_body(request).await? {
        Some(multipart) => read_image_field(multipart).await?,
        None => None,
    };

    let patch = MemePatch {
        title: params.title,
        description: params.description,
        image,
    };
    let meme = state.lifecycle.update(meme_id, patch).await?;

    tracing::info!(meme_id, "Meme updated successfully via handler");
    Ok(Json(meme))
}

pub async fn delete_meme(
    State(state): State<Arc<AppState>>,
    meme_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Meme>, AppError> {
    let Path(meme_id) = meme_id.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    tracing::debug!(meme_id, "Deleting meme via handler");
    let meme = state.lifecycle.delete(meme_id).await?;
    tracing::info!(meme_id, "Meme deleted successfully via handler");
    Ok(Json(meme))
}

/// The request body as multipart, or `None` when the request carries no
/// multipart content type.
async fn multipart_body(request: Request) -> Result<Option<Multipart>, AppError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));
    if !is_multipart {
        return Ok(None);
    }

    let multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| AppError::InvalidInput(e.body_text()))?;
    Ok(Some(multipart))
}

/// Pulls the image part out of a multipart body. Other parts are ignored.
async fn read_image_field(mut multipart: Multipart) -> Result<Option<ImageUpload>, AppError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        if field_name != FILE_FIELD {
            tracing::debug!("Ignoring unknown multipart field: {}", field_name);
            continue;
        }

        let filename = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|m| m.to_string());
        let data = field.bytes().await?.to_vec();
        upload = Some(ImageUpload {
            filename,
            content_type,
            data,
        });
    }

    Ok(upload)
}
