//! Project gallery routes.

use axum::{
    extract::{Multipart, Path, Request, State},
    http::StatusCode,
    response::Response,
    Json,
};

use crate::errors::{ApiResponse, AppError, Message};
use crate::middleware::rbac::{self, RequestContext};
use crate::models::image::ProjectImage;
use crate::services::images as image_service;
use crate::services::uploads::{self, MultipartForm};
use crate::AppState;

/// GET /projects/{id}/images
pub async fn list(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ProjectImage>>>, AppError> {
    let images = image_service::list(&state.docs, project_id).await?;
    Ok(ApiResponse::success(images))
}

/// GET /projects/{id}/image/{imageId}
pub async fn get(
    State(state): State<AppState>,
    Path((project_id, image_id)): Path<(i64, String)>,
    request: Request,
) -> Result<Response, AppError> {
    let path = image_service::image_path(&state.docs, project_id, &image_id).await?;
    uploads::serve_file(&path, request).await
}

/// POST /projects/{id}/image (multipart: `image`)
pub async fn upload(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(project_id): Path<i64>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ProjectImage>>), AppError> {
    rbac::ensure_project_access(&state.db, project_id, &ctx).await?;
    let mut form = MultipartForm::read(multipart).await?;
    let file = form
        .take_file("image")
        .ok_or_else(|| AppError::Validation("No image uploaded".to_string()))?;
    let image =
        image_service::add(&state.docs, &state.config.upload_dir, project_id, &file).await?;
    Ok(ApiResponse::created(image))
}

/// DELETE /projects/{id}/image/{imageId}
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((project_id, image_id)): Path<(i64, String)>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    rbac::ensure_project_access(&state.db, project_id, &ctx).await?;
    image_service::delete(&state.docs, project_id, &image_id).await?;
    Ok(ApiResponse::success(Message::new("Image deleted")))
}
