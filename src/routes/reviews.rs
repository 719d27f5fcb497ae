//! Project review routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::errors::{ApiResponse, AppError, Message};
use crate::middleware::auth::CurrentUser;
use crate::middleware::json::ApiJson;
use crate::middleware::rbac::RequestContext;
use crate::models::review::{Review, ReviewInput};
use crate::services::reviews as review_service;
use crate::AppState;

/// GET /projects/{id}/reviews
pub async fn list(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Review>>>, AppError> {
    let reviews = review_service::list(&state.docs, project_id).await?;
    Ok(ApiResponse::success(reviews))
}

/// GET /projects/reviews/byUser/reviewing: reviews the caller wrote.
pub async fn reviewing(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<Review>>>, AppError> {
    let reviews = review_service::reviewing(&state.docs, current_user.id).await?;
    Ok(ApiResponse::success(reviews))
}

/// GET /projects/reviews/byUser/reviewed: reviews on the caller's projects.
pub async fn reviewed(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<Review>>>, AppError> {
    let reviews = review_service::reviewed(&state.docs, current_user.id).await?;
    Ok(ApiResponse::success(reviews))
}

/// POST /projects/{id}/reviews
pub async fn create(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(project_id): Path<i64>,
    ApiJson(body): ApiJson<ReviewInput>,
) -> Result<(StatusCode, Json<ApiResponse<Review>>), AppError> {
    let review =
        review_service::create(&state.db, &state.docs, project_id, current_user.id, &body).await?;
    Ok(ApiResponse::created(review))
}

/// DELETE /projects/{id}/reviews/{reviewId} (author, project owner or admin)
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((project_id, review_id)): Path<(i64, String)>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    review_service::delete(&state.db, &state.docs, project_id, &review_id, &ctx).await?;
    Ok(ApiResponse::success(Message::new("Review deleted")))
}
