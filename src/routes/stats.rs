//! Engagement routes nested under a project, plus the category view shares.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::errors::{ApiResponse, AppError, Message};
use crate::middleware::auth::CurrentUser;
use crate::middleware::json::ApiJson;
use crate::models::engagement::{
    CategoryViewShare, EngagementRecord, ProjectSummary, RecordView, UpdateEngagement, ViewOutcome,
};
use crate::services::{projects as project_service, stats as stats_service};
use crate::AppState;

/// GET /projects/{id}/stats
pub async fn summary(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<ApiResponse<ProjectSummary>>, AppError> {
    let summary = stats_service::summarize(&state.docs, project_id).await?;
    Ok(ApiResponse::success(summary))
}

/// POST /projects/{id}/stats: create-on-view, idempotent.
///
/// `idCategory` defaults to the project's own category.
pub async fn record_view(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(project_id): Path<i64>,
    ApiJson(body): ApiJson<RecordView>,
) -> Result<(StatusCode, Json<ApiResponse<ViewOutcome>>), AppError> {
    let category_id = match body.id_category {
        Some(id) => id,
        None => {
            project_service::find_by_id(&state.db, project_id)
                .await?
                .id_category
        }
    };
    let outcome =
        stats_service::record_view(&state.docs, current_user.id, project_id, category_id).await?;
    if outcome.created {
        Ok(ApiResponse::created(outcome))
    } else {
        Ok((StatusCode::OK, ApiResponse::success(outcome)))
    }
}

/// PUT /projects/{id}/stats/views
pub async fn mark_viewed(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(project_id): Path<i64>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    stats_service::mark_viewed(&state.docs, current_user.id, project_id).await?;
    Ok(ApiResponse::success(Message::new("Project viewed")))
}

/// PUT /projects/{id}/stats: evaluate, fund or collaborate.
pub async fn update(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(project_id): Path<i64>,
    ApiJson(body): ApiJson<UpdateEngagement>,
) -> Result<Json<ApiResponse<EngagementRecord>>, AppError> {
    let record =
        stats_service::update_engagement(&state.docs, current_user.id, project_id, &body).await?;
    Ok(ApiResponse::success(record))
}

/// GET /projects/stats/percentageViews
pub async fn percentage_views(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CategoryViewShare>>>, AppError> {
    let shares = stats_service::category_view_shares(&state.docs).await?;
    Ok(ApiResponse::success(shares))
}
