//! Project blog routes. Mutations are limited to the project owner or an admin.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::errors::{ApiResponse, AppError, Message};
use crate::middleware::json::ApiJson;
use crate::middleware::rbac::{self, RequestContext};
use crate::models::blog::{Blog, BlogInput};
use crate::services::blogs as blog_service;
use crate::AppState;

/// GET /projects/{id}/blogs
pub async fn list(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Blog>>>, AppError> {
    let blogs = blog_service::list(&state.docs, project_id).await?;
    Ok(ApiResponse::success(blogs))
}

/// POST /projects/{id}/blogs
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(project_id): Path<i64>,
    ApiJson(body): ApiJson<BlogInput>,
) -> Result<(StatusCode, Json<ApiResponse<Blog>>), AppError> {
    rbac::ensure_project_access(&state.db, project_id, &ctx).await?;
    let blog = blog_service::create(&state.docs, project_id, &body).await?;
    Ok(ApiResponse::created(blog))
}

/// PUT /projects/{id}/blogs/{blogId}
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((project_id, blog_id)): Path<(i64, String)>,
    ApiJson(body): ApiJson<BlogInput>,
) -> Result<Json<ApiResponse<Blog>>, AppError> {
    rbac::ensure_project_access(&state.db, project_id, &ctx).await?;
    let blog = blog_service::update(&state.docs, project_id, &blog_id, &body).await?;
    Ok(ApiResponse::success(blog))
}

/// DELETE /projects/{id}/blogs/{blogId}
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((project_id, blog_id)): Path<(i64, String)>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    rbac::ensure_project_access(&state.db, project_id, &ctx).await?;
    blog_service::delete(&state.docs, project_id, &blog_id).await?;
    Ok(ApiResponse::success(Message::new("Blog deleted")))
}
