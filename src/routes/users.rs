//! User routes: own profile, public profiles, search, account maintenance,
//! profile images and the admin panel.

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    response::Response,
    Json,
};

use crate::errors::{ApiResponse, AppError, Message};
use crate::middleware::auth::CurrentUser;
use crate::middleware::json::ApiJson;
use crate::middleware::rbac::RequireAdmin;
use crate::models::pagination::{Pagination, SearchQuery};
use crate::models::user::{
    ChangePassword, DeleteAccount, PublicProfile, UpdateProfile, UserResponse, UserSummary,
};
use crate::services::uploads::{self, MultipartForm};
use crate::services::users::{self as user_service, ProfileImage};
use crate::AppState;

/// GET /users: the caller's own profile.
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = user_service::profile(&state.db, current_user.id).await?;
    Ok(ApiResponse::success(user))
}

/// GET /users/byId/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = user_service::profile(&state.db, id).await?;
    Ok(ApiResponse::success(user))
}

/// GET /users/{url}: public profile with follow counts.
pub async fn get_by_url(
    State(state): State<AppState>,
    Path(url): Path<String>,
) -> Result<Json<ApiResponse<PublicProfile>>, AppError> {
    let profile = user_service::public_profile(&state.db, &state.docs, &url).await?;
    Ok(ApiResponse::success(profile))
}

/// GET /users/search/user?search=&startIndex=&limit=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>, AppError> {
    let window = pagination.window()?;
    let users = user_service::search(&state.db, query.term()?, window).await?;
    Ok(ApiResponse::success(users))
}

/// PUT /users
pub async fn update(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(body): ApiJson<UpdateProfile>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = user_service::update_profile(&state.db, &state.docs, current_user.id, &body).await?;
    Ok(ApiResponse::success(user))
}

/// PUT /users/changePassword
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(body): ApiJson<ChangePassword>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    user_service::change_password(&state.db, current_user.id, &body).await?;
    Ok(ApiResponse::success(Message::new("Password updated")))
}

/// DELETE /users: delete the caller's own account. Google accounts may send
/// no body at all.
pub async fn delete_me(
    State(state): State<AppState>,
    current_user: CurrentUser,
    body: Option<ApiJson<DeleteAccount>>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let password = body.and_then(|ApiJson(body)| body.password);
    user_service::delete_account(&state.db, &state.docs, current_user.id, password.as_deref())
        .await?;
    Ok(ApiResponse::success(Message::new("User deleted successfully")))
}

fn parse_user_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid user id: {raw}")))
}

/// DELETE /users/{id} (admin)
pub async fn delete_by_id(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let id = parse_user_id(&raw_id)?;
    user_service::delete_user(&state.db, &state.docs, id).await?;
    tracing::info!(admin_id = admin.id, user_id = id, "User deleted by admin");
    Ok(ApiResponse::success(Message::new("User deleted successfully")))
}

/// GET /users/admin/panel?startIndex=&limit= (admin)
pub async fn admin_panel(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>, AppError> {
    let users = user_service::admin_panel(&state.db, pagination.window()?).await?;
    Ok(ApiResponse::success(users))
}

async fn upload_profile_image(
    state: &AppState,
    user_id: i64,
    kind: ProfileImage,
    multipart: Multipart,
) -> Result<(), AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form.take_file(kind.field_name()).ok_or_else(|| {
        AppError::Validation(format!("Missing '{}' file", kind.field_name()))
    })?;
    user_service::set_profile_image(
        &state.db,
        &state.config.upload_dir,
        user_id,
        kind,
        form.text("password"),
        &file,
    )
    .await
}

/// PUT /users/profilePicture (multipart: `password`, `profilePicture`)
pub async fn update_profile_picture(
    State(state): State<AppState>,
    current_user: CurrentUser,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    upload_profile_image(&state, current_user.id, ProfileImage::Picture, multipart).await?;
    Ok(ApiResponse::success(Message::new("Profile picture updated successfully")))
}

/// PUT /users/profileCover (multipart: `password`, `profileCover`)
pub async fn update_profile_cover(
    State(state): State<AppState>,
    current_user: CurrentUser,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    upload_profile_image(&state, current_user.id, ProfileImage::Banner, multipart).await?;
    Ok(ApiResponse::success(Message::new("Profile cover updated successfully")))
}

/// GET /users/{url}/profilePicture
pub async fn profile_picture(
    State(state): State<AppState>,
    Path(url): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    let path = user_service::profile_image_path(&state.db, &url, ProfileImage::Picture).await?;
    uploads::serve_file(&path, request).await
}

/// GET /users/{url}/profileBanner
pub async fn profile_banner(
    State(state): State<AppState>,
    Path(url): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    let path = user_service::profile_image_path(&state.db, &url, ProfileImage::Banner).await?;
    uploads::serve_file(&path, request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_segment_must_be_numeric() {
        assert_eq!(parse_user_id("42").unwrap(), 42);
        let err = parse_user_id("jane_creator").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
