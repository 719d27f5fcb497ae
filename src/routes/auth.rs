//! Authentication routes: register, login, Google sign-in, email verification
//! and password recovery.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError, Message};
use crate::middleware::auth::CurrentUser;
use crate::middleware::json::ApiJson;
use crate::models::user::RegisterUser;
use crate::services::auth::{self as auth_service, AuthResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    #[serde(default)]
    pub credential: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoverPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterUser>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), AppError> {
    let auth = auth_service::register(
        &state.db,
        &body,
        &state.config.jwt_secret,
        state.config.jwt_expiry_secs,
    )
    .await?;
    Ok(ApiResponse::created(auth))
}

/// POST /auth/login: `username` may also be an email address.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let auth = auth_service::login(
        &state.db,
        &body.username,
        &body.password,
        &state.config.jwt_secret,
        state.config.jwt_expiry_secs,
    )
    .await?;
    Ok(ApiResponse::success(auth))
}

/// POST /auth/login/google
pub async fn google_login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GoogleLoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let auth =
        auth_service::google_login(&state.db, &state.http, &state.config, &body.credential).await?;
    Ok(ApiResponse::success(auth))
}

/// POST /auth/verifyEmail: mail a verification link to the caller.
pub async fn request_email_verification(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    auth_service::request_email_verification(&state.db, current_user.id, &state.config).await?;
    Ok(ApiResponse::success(Message::new("Verification email sent")))
}

/// GET /auth/verifyEmail/{token}
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    auth_service::verify_email(&state.db, &token, &state.config.jwt_secret).await?;
    Ok(ApiResponse::success(Message::new("Email verified")))
}

/// POST /auth/recoverPassword: always succeeds so addresses cannot be probed.
pub async fn recover_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RecoverPasswordRequest>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    if body.email.trim().is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }
    auth_service::request_password_reset(&state.db, &body.email, &state.config).await?;
    Ok(ApiResponse::success(Message::new(
        "If the address is registered, a recovery email has been sent",
    )))
}

/// POST /auth/resetPassword
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    auth_service::reset_password(
        &state.db,
        &body.token,
        &body.new_password,
        &body.confirm_password,
        &state.config.jwt_secret,
    )
    .await?;
    Ok(ApiResponse::success(Message::new("Password updated")))
}
