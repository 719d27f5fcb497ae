//! Reward tier routes. Tier forms are multipart so an image can ride along.

use axum::{
    extract::{Multipart, Path, Request, State},
    http::StatusCode,
    response::Response,
    Json,
};

use crate::errors::{ApiResponse, AppError, Message};
use crate::middleware::rbac::{self, RequestContext};
use crate::models::tier::{Tier, TierInput};
use crate::services::tiers as tier_service;
use crate::services::uploads::{self, MultipartForm, UploadedFile};
use crate::AppState;

async fn read_form(multipart: Multipart) -> Result<(TierInput, Option<UploadedFile>), AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    let input = TierInput::parse(
        form.text("title"),
        form.text("description"),
        form.text("price"),
    )?;
    Ok((input, form.take_file("image")))
}

/// GET /projects/{id}/tiers
pub async fn list(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Tier>>>, AppError> {
    let tiers = tier_service::list(&state.docs, project_id).await?;
    Ok(ApiResponse::success(tiers))
}

/// GET /projects/{id}/tiers/{tierId}/image
pub async fn image(
    State(state): State<AppState>,
    Path((project_id, tier_id)): Path<(i64, String)>,
    request: Request,
) -> Result<Response, AppError> {
    let path = tier_service::image_path(&state.docs, project_id, &tier_id).await?;
    uploads::serve_file(&path, request).await
}

/// POST /projects/{id}/tiers (multipart: `title`, `description`, `price`, `image`?)
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(project_id): Path<i64>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Tier>>), AppError> {
    rbac::ensure_project_access(&state.db, project_id, &ctx).await?;
    let (input, image) = read_form(multipart).await?;
    let tier = tier_service::create(
        &state.docs,
        &state.config.upload_dir,
        project_id,
        input,
        image,
    )
    .await?;
    Ok(ApiResponse::created(tier))
}

/// PUT /projects/{id}/tiers/{tierId}
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((project_id, tier_id)): Path<(i64, String)>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Tier>>, AppError> {
    rbac::ensure_project_access(&state.db, project_id, &ctx).await?;
    let (input, image) = read_form(multipart).await?;
    let tier = tier_service::update(
        &state.docs,
        &state.config.upload_dir,
        project_id,
        &tier_id,
        input,
        image,
    )
    .await?;
    Ok(ApiResponse::success(tier))
}

/// DELETE /projects/{id}/tiers/{tierId}
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((project_id, tier_id)): Path<(i64, String)>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    rbac::ensure_project_access(&state.db, project_id, &ctx).await?;
    tier_service::delete(&state.docs, project_id, &tier_id).await?;
    Ok(ApiResponse::success(Message::new("Tier deleted")))
}
