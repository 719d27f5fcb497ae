//! Category routes. Reads are public, writes are admin-only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::errors::{ApiResponse, AppError, Message};
use crate::middleware::json::ApiJson;
use crate::middleware::rbac::RequireAdmin;
use crate::models::category::{Category, CreateCategory};
use crate::services::categories as category_service;
use crate::AppState;

/// GET /categories
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Category>>>, AppError> {
    let categories = category_service::list(&state.db).await?;
    Ok(ApiResponse::success(categories))
}

/// GET /categories/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Category>>, AppError> {
    let category = category_service::find_by_id(&state.db, id).await?;
    Ok(ApiResponse::success(category))
}

/// POST /categories (admin)
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(body): ApiJson<CreateCategory>,
) -> Result<(StatusCode, Json<ApiResponse<Category>>), AppError> {
    let category = category_service::create(&state.db, &body).await?;
    Ok(ApiResponse::created(category))
}

/// DELETE /categories/{id} (admin)
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    category_service::delete(&state.db, id).await?;
    Ok(ApiResponse::success(Message::new("Category deleted")))
}
