//! Project routes: feeds, detail, and owner-or-admin mutations.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::errors::{ApiResponse, AppError, Message};
use crate::middleware::auth::CurrentUser;
use crate::middleware::json::ApiJson;
use crate::middleware::rbac::{self, RequestContext};
use crate::models::pagination::{Pagination, SearchQuery};
use crate::models::project::{CreatedProject, Project, ProjectFeedItem, ProjectInput};
use crate::services::projects as project_service;
use crate::AppState;

type Feed = Json<ApiResponse<Vec<ProjectFeedItem>>>;

/// GET /projects?startIndex=&limit=
pub async fn list(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Feed, AppError> {
    let items = project_service::list(&state.db, &state.docs, pagination.window()?).await?;
    Ok(ApiResponse::success(items))
}

/// GET /projects/byCategory/{id}
pub async fn by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
    Query(pagination): Query<Pagination>,
) -> Result<Feed, AppError> {
    let window = pagination.window()?;
    let items = project_service::by_category(&state.db, &state.docs, category_id, window).await?;
    Ok(ApiResponse::success(items))
}

/// GET /projects/byUser/{id}
pub async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(pagination): Query<Pagination>,
) -> Result<Feed, AppError> {
    let window = pagination.window()?;
    let items = project_service::by_user(&state.db, &state.docs, user_id, window).await?;
    Ok(ApiResponse::success(items))
}

/// GET /projects/random
pub async fn random(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Feed, AppError> {
    let items = project_service::random(&state.db, &state.docs, pagination.window()?).await?;
    Ok(ApiResponse::success(items))
}

/// GET /projects/search?search=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Query(pagination): Query<Pagination>,
) -> Result<Feed, AppError> {
    let window = pagination.window()?;
    let items = project_service::search(&state.db, &state.docs, query.term()?, window).await?;
    Ok(ApiResponse::success(items))
}

/// GET /projects/byInterest: ranked by the caller's viewing history.
pub async fn by_interest(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Feed, AppError> {
    let window = pagination.window()?;
    let items =
        project_service::by_interest(&state.db, &state.docs, current_user.id, window).await?;
    Ok(ApiResponse::success(items))
}

/// GET /projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProjectFeedItem>>, AppError> {
    let project = project_service::find_by_id(&state.db, id).await?;
    let item = project_service::feed_item(&state.docs, project).await?;
    Ok(ApiResponse::success(item))
}

/// POST /projects
pub async fn create(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(body): ApiJson<ProjectInput>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedProject>>), AppError> {
    let created = project_service::create(&state.db, current_user.id, &body).await?;
    Ok(ApiResponse::created(created))
}

/// PUT /projects/{id} (owner or admin)
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<ProjectInput>,
) -> Result<Json<ApiResponse<Project>>, AppError> {
    rbac::ensure_project_access(&state.db, id, &ctx).await?;
    let project = project_service::update(&state.db, id, &body).await?;
    Ok(ApiResponse::success(project))
}

/// DELETE /projects/{id} (owner or admin)
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    rbac::ensure_project_access(&state.db, id, &ctx).await?;
    project_service::delete(&state.db, &state.docs, id).await?;
    Ok(ApiResponse::success(Message::new("Project deleted")))
}
