//! Authentication service: password hashing, JWT, registration, login and
//! the email verification / password recovery flows.

use std::sync::LazyLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::user::{RegisterUser, Role, User};
use crate::services::mail;

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// What a token may be used for. A token is only accepted for its own purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Access,
    VerifyEmail,
    ResetPassword,
}

/// JWT claims. Roles are deliberately absent: admin rights are read from the
/// database on every request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub purpose: TokenPurpose,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub.parse().map_err(|_| AppError::Unauthorized)
    }
}

/// Returned by every successful sign-in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user_url: String,
    pub verified_email: bool,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    aud: String,
    email: String,
    #[serde(default)]
    email_verified: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
}

/// Hash a plaintext password with argon2id.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Public profile url derived from a username: whitespace runs become `_`.
pub fn url_slug(username: &str) -> String {
    WHITESPACE
        .replace_all(username.trim(), "_")
        .to_lowercase()
}

/// Sign a token for `user_id`.
pub fn issue_token(
    user_id: i64,
    purpose: TokenPurpose,
    jwt_secret: &str,
    expiry_secs: i64,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        purpose,
        exp: (now + Duration::seconds(expiry_secs)).timestamp(),
        iat: now.timestamp(),
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))
}

/// Validate signature, expiry and purpose of a token.
pub fn validate_token(
    token: &str,
    jwt_secret: &str,
    purpose: TokenPurpose,
) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let validation = Validation::default();

    let claims = jsonwebtoken::decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)?;

    if claims.purpose != purpose {
        return Err(AppError::Unauthorized);
    }
    Ok(claims)
}

fn auth_response(user: &User, jwt_secret: &str, expiry_secs: i64) -> Result<AuthResponse, AppError> {
    Ok(AuthResponse {
        token: issue_token(user.id, TokenPurpose::Access, jwt_secret, expiry_secs)?,
        user_url: user.url.clone(),
        verified_email: user.verified_email,
        role: user.role(),
    })
}

/// Register a new account and sign it in.
pub async fn register(
    pool: &PgPool,
    input: &RegisterUser,
    jwt_secret: &str,
    expiry_secs: i64,
) -> Result<AuthResponse, AppError> {
    if input.username.trim().is_empty()
        || input.email.trim().is_empty()
        || input.password.is_empty()
        || input.confirmation_password.is_empty()
    {
        return Err(AppError::Validation("All fields are required!".to_string()));
    }
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if input.password != input.confirmation_password {
        return Err(AppError::Validation("Passwords do not match!".to_string()));
    }

    let username = input.username.trim();
    let url = url_slug(username);

    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2 OR url = $3)",
    )
    .bind(username)
    .bind(&input.email)
    .bind(&url)
    .fetch_one(pool)
    .await?;
    if taken {
        return Err(AppError::Validation("User already exists!".to_string()));
    }

    let password_hash = hash_password(&input.password)?;
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, url, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(username)
    .bind(&input.email)
    .bind(&url)
    .bind(&password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Validation("User already exists!".to_string())
        }
        _ => AppError::Database(e),
    })?;

    tracing::info!(user_id = user.id, url = %user.url, "User registered");
    auth_response(&user, jwt_secret, expiry_secs)
}

/// Authenticate by username or email.
pub async fn login(
    pool: &PgPool,
    username: &str,
    password: &str,
    jwt_secret: &str,
    expiry_secs: i64,
) -> Result<AuthResponse, AppError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation("All fields are required!".to_string()));
    }

    let query = if looks_like_email(username) {
        "SELECT * FROM users WHERE email = $1"
    } else {
        "SELECT * FROM users WHERE username = $1"
    };

    let user = sqlx::query_as::<_, User>(query)
        .bind(username.trim())
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let hash = user.password_hash.as_deref().ok_or(AppError::Unauthorized)?;
    if !verify_password(password, hash)? {
        return Err(AppError::Unauthorized);
    }

    auth_response(&user, jwt_secret, expiry_secs)
}

fn looks_like_email(value: &str) -> bool {
    match (value.find('@'), value.rfind('.')) {
        (Some(at), Some(dot)) => at < dot,
        _ => false,
    }
}

/// Sign in with a Google ID token, creating the account on first use.
pub async fn google_login(
    pool: &PgPool,
    http: &reqwest::Client,
    config: &AppConfig,
    credential: &str,
) -> Result<AuthResponse, AppError> {
    let client_id = config
        .google_client_id
        .as_deref()
        .ok_or_else(|| AppError::Internal("GOOGLE_CLIENT_ID is not configured".to_string()))?;
    if credential.trim().is_empty() {
        return Err(AppError::Validation("credential is required".to_string()));
    }

    let url = reqwest::Url::parse_with_params(GOOGLE_TOKENINFO_URL, &[("id_token", credential)])
        .map_err(|e| AppError::Internal(format!("Invalid tokeninfo url: {e}")))?;
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::Internal(format!("Google token check failed: {e}")))?;
    if !response.status().is_success() {
        return Err(AppError::Unauthorized);
    }
    let info: GoogleTokenInfo = response
        .json()
        .await
        .map_err(|e| AppError::Internal(format!("Unexpected tokeninfo payload: {e}")))?;

    if info.aud != client_id || info.email_verified.as_deref() != Some("true") {
        return Err(AppError::Unauthorized);
    }

    let existing = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&info.email)
        .fetch_optional(pool)
        .await?;

    let user = match existing {
        Some(user) => user,
        None => create_google_user(pool, &info).await?,
    };

    auth_response(&user, &config.jwt_secret, config.jwt_expiry_secs)
}

async fn create_google_user(pool: &PgPool, info: &GoogleTokenInfo) -> Result<User, AppError> {
    let base = info
        .name
        .clone()
        .or_else(|| info.email.split('@').next().map(String::from))
        .unwrap_or_else(|| "user".to_string());

    let mut username = base.trim().to_string();
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR url = $2)",
    )
    .bind(&username)
    .bind(url_slug(&username))
    .fetch_one(pool)
    .await?;
    if taken {
        let suffix = Uuid::new_v4().simple().to_string();
        username = format!("{username}_{}", &suffix[..6]);
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, url, name, last_name, google_account, verified_email)
        VALUES ($1, $2, $3, $4, $5, TRUE, TRUE)
        RETURNING *
        "#,
    )
    .bind(&username)
    .bind(&info.email)
    .bind(url_slug(&username))
    .bind(&info.given_name)
    .bind(&info.family_name)
    .fetch_one(pool)
    .await?;

    tracing::info!(user_id = user.id, "User registered through Google");
    Ok(user)
}

/// Send a verification link to the caller's email address.
pub async fn request_email_verification(
    pool: &PgPool,
    user_id: i64,
    config: &AppConfig,
) -> Result<(), AppError> {
    let user = find_user_by_id(pool, user_id).await?;
    if user.verified_email {
        return Err(AppError::Validation("Email already verified".to_string()));
    }

    let token = issue_token(
        user.id,
        TokenPurpose::VerifyEmail,
        &config.jwt_secret,
        config.email_token_expiry_secs,
    )?;
    mail::send_verification_email(&config.frontend_url, &user.email, &token);
    Ok(())
}

/// Consume a verification token.
pub async fn verify_email(pool: &PgPool, token: &str, jwt_secret: &str) -> Result<(), AppError> {
    let claims = validate_token(token, jwt_secret, TokenPurpose::VerifyEmail)?;
    let user_id = claims.user_id()?;

    let result = sqlx::query(
        "UPDATE users SET verified_email = TRUE, updated_at = NOW() WHERE id = $1",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(())
}

/// Send a password reset link. Succeeds whether or not the address is known.
pub async fn request_password_reset(
    pool: &PgPool,
    email: &str,
    config: &AppConfig,
) -> Result<(), AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE email = $1 AND password_hash IS NOT NULL",
    )
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;

    match user {
        Some(user) => {
            let token = issue_token(
                user.id,
                TokenPurpose::ResetPassword,
                &config.jwt_secret,
                config.email_token_expiry_secs,
            )?;
            mail::send_password_reset_email(&config.frontend_url, &user.email, &token);
        }
        None => tracing::debug!("Password reset requested for unknown address"),
    }
    Ok(())
}

/// Set a new password from a reset token.
pub async fn reset_password(
    pool: &PgPool,
    token: &str,
    new_password: &str,
    confirm_password: &str,
    jwt_secret: &str,
) -> Result<(), AppError> {
    if new_password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters long!".to_string(),
        ));
    }
    if new_password != confirm_password {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }

    let claims = validate_token(token, jwt_secret, TokenPurpose::ResetPassword)?;
    let hash = hash_password(new_password)?;

    let result =
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(&hash)
            .bind(claims.user_id()?)
            .execute(pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(())
}

/// Find a user by ID.
pub async fn find_user_by_id(pool: &PgPool, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_and_verify() {
        let password = "SecurePassword123!";
        let hash = hash_password(password).unwrap();
        assert_ne!(hash, password);
        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("WrongPassword", &hash).unwrap());
    }

    #[test]
    fn token_generation_and_validation() {
        let secret = "test-secret-key-for-jwt";
        let token = issue_token(42, TokenPurpose::Access, secret, 900).unwrap();

        let claims = validate_token(&token, secret, TokenPurpose::Access).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.purpose, TokenPurpose::Access);
    }

    #[test]
    fn token_of_other_purpose_rejected() {
        let secret = "test-secret";
        let token = issue_token(1, TokenPurpose::ResetPassword, secret, 900).unwrap();
        assert!(validate_token(&token, secret, TokenPurpose::Access).is_err());
        assert!(validate_token(&token, secret, TokenPurpose::ResetPassword).is_ok());
    }

    #[test]
    fn token_with_wrong_secret_rejected() {
        let token = issue_token(1, TokenPurpose::Access, "secret-a", 900).unwrap();
        let err = validate_token(&token, "secret-b", TokenPurpose::Access).unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn invalid_token_rejected() {
        let result = validate_token("garbage.token.here", "secret", TokenPurpose::Access);
        assert!(result.is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let secret = "test-secret";
        // Expired well beyond the 60s leeway window
        let token = issue_token(3, TokenPurpose::Access, secret, -3600).unwrap();
        let result = validate_token(&token, secret, TokenPurpose::Access);
        assert!(result.is_err());
    }

    #[test]
    fn url_slug_replaces_whitespace() {
        assert_eq!(url_slug("Ada  Lovelace"), "ada_lovelace");
        assert_eq!(url_slug(" grace\thopper "), "grace_hopper");
        assert_eq!(url_slug("linus"), "linus");
    }

    #[test]
    fn email_detection_for_login() {
        assert!(looks_like_email("ada@fundflow.test"));
        assert!(!looks_like_email("ada"));
        assert!(!looks_like_email("first.last@localhost"));
    }
}
