//! Follow routes. The follower is always the caller.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::errors::{ApiResponse, AppError, Message};
use crate::middleware::auth::CurrentUser;
use crate::middleware::json::ApiJson;
use crate::models::follow::{FollowDocument, FollowRequest};
use crate::services::follows as follow_service;
use crate::AppState;

/// POST /follows/follow `{userUrl}`
pub async fn follow(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(body): ApiJson<FollowRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FollowDocument>>), AppError> {
    let edge =
        follow_service::follow(&state.db, &state.docs, current_user.id, &body.user_url).await?;
    Ok(ApiResponse::created(edge))
}

/// DELETE /follows/unfollow `{userUrl}`
pub async fn unfollow(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(body): ApiJson<FollowRequest>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    follow_service::unfollow(&state.db, &state.docs, current_user.id, &body.user_url).await?;
    Ok(ApiResponse::success(Message::new("Unfollowed")))
}

/// GET /follows/{userUrl}/followers
pub async fn followers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(user_url): Path<String>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let urls = follow_service::followers(&state.docs, &user_url).await?;
    Ok(ApiResponse::success(urls))
}

/// GET /follows/{userUrl}/following
pub async fn following(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(user_url): Path<String>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let urls = follow_service::following(&state.docs, &user_url).await?;
    Ok(ApiResponse::success(urls))
}

/// GET /follows/{userUrl}/isFollowing/{targetUrl}: 404 when not following.
pub async fn is_following(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((user_url, target_url)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    if follow_service::is_following(&state.docs, &user_url, &target_url).await? {
        Ok(ApiResponse::success(Message::new("Following")))
    } else {
        Err(AppError::NotFound("Not following".to_string()))
    }
}
