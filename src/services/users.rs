//! Profiles, account maintenance and profile images.

use mongodb::Database;
use sqlx::PgPool;
use validator::Validate;

use crate::errors::AppError;
use crate::models::pagination::Window;
use crate::models::user::{ChangePassword, PublicProfile, UpdateProfile, User, UserResponse, UserSummary};
use crate::services::auth::{self as auth_service, find_user_by_id, url_slug};
use crate::services::uploads::{self, UploadedFile, PROFILES_DIR};
use crate::services::{follows, projects, reviews, stats};

/// Which of the two profile images a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileImage {
    Picture,
    Banner,
}

impl ProfileImage {
    fn column(self) -> &'static str {
        match self {
            ProfileImage::Picture => "profile_picture_src",
            ProfileImage::Banner => "banner_picture_src",
        }
    }

    /// Multipart field carrying the file.
    pub fn field_name(self) -> &'static str {
        match self {
            ProfileImage::Picture => "profilePicture",
            ProfileImage::Banner => "profileCover",
        }
    }

    fn stored(self, user: &User) -> Option<&str> {
        match self {
            ProfileImage::Picture => user.profile_picture_src.as_deref(),
            ProfileImage::Banner => user.banner_picture_src.as_deref(),
        }
    }
}

/// Re-check the account password before a sensitive change. Accounts created
/// through Google sign-in have no password and pass.
pub fn ensure_password(user: &User, password: Option<&str>) -> Result<(), AppError> {
    let Some(hash) = user.password_hash.as_deref() else {
        return Ok(());
    };
    let password = password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Password is required".to_string()))?;
    if !auth_service::verify_password(password, hash)? {
        return Err(AppError::Validation("Password is incorrect".to_string()));
    }
    Ok(())
}

async fn find_by_url(pool: &PgPool, url: &str) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE url = $1")
        .bind(url)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn profile(pool: &PgPool, user_id: i64) -> Result<UserResponse, AppError> {
    Ok(find_user_by_id(pool, user_id).await?.into())
}

/// Public profile with follow counts.
pub async fn public_profile(pool: &PgPool, docs: &Database, url: &str) -> Result<PublicProfile, AppError> {
    let user = find_by_url(pool, url).await?;
    let (followers, following) = follows::counts(docs, &user.url).await?;
    Ok(PublicProfile {
        user: user.into(),
        followers,
        following,
    })
}

/// Username or url substring search.
pub async fn search(pool: &PgPool, term: &str, window: Window) -> Result<Vec<UserSummary>, AppError> {
    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT id, username, email, url, verified, verified_email FROM users
        WHERE username ILIKE $1 OR url ILIKE $1
        ORDER BY username LIMIT $2 OFFSET $3
        "#,
    )
    .bind(projects::like_pattern(term))
    .bind(window.limit)
    .bind(window.offset)
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Every account, oldest first.
pub async fn admin_panel(pool: &PgPool, window: Window) -> Result<Vec<UserSummary>, AppError> {
    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT id, username, email, url, verified, verified_email FROM users
        ORDER BY id LIMIT $1 OFFSET $2
        "#,
    )
    .bind(window.limit)
    .bind(window.offset)
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Update profile fields. The url follows the username; follow edges and
/// review bylines are rewritten when either changes.
pub async fn update_profile(
    pool: &PgPool,
    docs: &Database,
    user_id: i64,
    input: &UpdateProfile,
) -> Result<UserResponse, AppError> {
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let current = find_user_by_id(pool, user_id).await?;
    ensure_password(&current, input.current_password.as_deref())?;

    let username = input.username.trim();
    let url = url_slug(username);
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE (username = $1 OR email = $2 OR url = $3) AND id <> $4)",
    )
    .bind(username)
    .bind(&input.email)
    .bind(&url)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    if taken {
        return Err(AppError::Conflict("Username or email already in use".to_string()));
    }

    let email_changed = current.email != input.email;
    let updated = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            username = $1, email = $2, url = $3, name = $4, last_name = $5, biography = $6,
            verified_email = verified_email AND NOT $7, updated_at = NOW()
        WHERE id = $8
        RETURNING *
        "#,
    )
    .bind(username)
    .bind(&input.email)
    .bind(&url)
    .bind(&input.name)
    .bind(&input.last_name)
    .bind(&input.biography)
    .bind(email_changed)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    if updated.url != current.url {
        follows::rename_user(docs, &current.url, &updated.url).await?;
    }
    if updated.url != current.url || updated.username != current.username {
        reviews::rename_author(docs, user_id, &updated.url, &updated.username).await?;
    }
    tracing::info!(user_id, "Profile updated");
    Ok(updated.into())
}

pub async fn change_password(pool: &PgPool, user_id: i64, input: &ChangePassword) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if input.new_password != input.confirm_password {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }
    let user = find_user_by_id(pool, user_id).await?;
    if user.password_hash.is_none() {
        return Err(AppError::Validation(
            "Accounts created with Google have no password".to_string(),
        ));
    }
    ensure_password(&user, Some(&input.current_password))?;

    let hash = auth_service::hash_password(&input.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(&hash)
        .bind(user_id)
        .execute(pool)
        .await?;
    tracing::info!(user_id, "Password changed");
    Ok(())
}

/// Delete an account after its documents. Projects go with the row.
async fn remove_account(pool: &PgPool, docs: &Database, user: &User) -> Result<(), AppError> {
    for project_id in projects::ids_owned_by(pool, user.id).await? {
        projects::purge_documents(docs, project_id).await;
    }
    if let Err(e) = stats::purge_user(docs, user.id).await {
        tracing::warn!(user_id = user.id, error = %e, "Failed to purge engagement records");
    }
    if let Err(e) = reviews::purge_user(docs, user.id).await {
        tracing::warn!(user_id = user.id, error = %e, "Failed to purge reviews");
    }
    if let Err(e) = follows::purge_user(docs, &user.url).await {
        tracing::warn!(user_id = user.id, error = %e, "Failed to purge follows");
    }
    for src in [&user.profile_picture_src, &user.banner_picture_src].into_iter().flatten() {
        uploads::remove_file(src).await;
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    tracing::info!(user_id = user.id, "User deleted");
    Ok(())
}

/// Self-service deletion, confirmed with the account password.
pub async fn delete_account(
    pool: &PgPool,
    docs: &Database,
    user_id: i64,
    password: Option<&str>,
) -> Result<(), AppError> {
    let user = find_user_by_id(pool, user_id).await?;
    ensure_password(&user, password)?;
    remove_account(pool, docs, &user).await
}

/// Administrative deletion of any account.
pub async fn delete_user(pool: &PgPool, docs: &Database, user_id: i64) -> Result<(), AppError> {
    let user = find_user_by_id(pool, user_id).await?;
    remove_account(pool, docs, &user).await
}

/// Replace a profile image after a password re-check.
pub async fn set_profile_image(
    pool: &PgPool,
    upload_dir: &str,
    user_id: i64,
    kind: ProfileImage,
    password: Option<&str>,
    file: &UploadedFile,
) -> Result<(), AppError> {
    let user = find_user_by_id(pool, user_id).await?;
    ensure_password(&user, password)?;

    let prefix = format!("user_{user_id}_{}", kind.field_name());
    let stored = uploads::save_image(upload_dir, PROFILES_DIR, &prefix, file).await?;
    let sql = format!(
        "UPDATE users SET {} = $1, updated_at = NOW() WHERE id = $2",
        kind.column()
    );
    let written = sqlx::query(&sql)
        .bind(&stored)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::from);
    uploads::settle_replacement(written, Some(stored.as_str()), kind.stored(&user)).await?;
    Ok(())
}

/// Stored path of a user's profile image.
pub async fn profile_image_path(pool: &PgPool, url: &str, kind: ProfileImage) -> Result<String, AppError> {
    let user = find_by_url(pool, url).await?;
    kind.stored(&user)
        .map(String::from)
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(password_hash: Option<String>) -> User {
        User {
            id: 3,
            username: "grace".into(),
            email: "grace@fundflow.test".into(),
            url: "grace".into(),
            google_account: password_hash.is_none(),
            password_hash,
            is_admin: false,
            name: None,
            last_name: None,
            biography: None,
            verified: false,
            verified_email: false,
            profile_picture_src: Some("uploads/profiles/p.png".into()),
            banner_picture_src: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn password_recheck() {
        let hash = auth_service::hash_password("CorrectHorse1").unwrap();
        let u = user(Some(hash));
        assert!(ensure_password(&u, Some("CorrectHorse1")).is_ok());
        assert!(ensure_password(&u, Some("wrong-password")).is_err());
        assert!(ensure_password(&u, None).is_err());
        assert!(ensure_password(&u, Some("")).is_err());
    }

    #[test]
    fn google_accounts_skip_password_recheck() {
        assert!(ensure_password(&user(None), None).is_ok());
    }

    #[test]
    fn profile_image_kinds() {
        let u = user(None);
        assert_eq!(ProfileImage::Picture.stored(&u), Some("uploads/profiles/p.png"));
        assert_eq!(ProfileImage::Banner.stored(&u), None);
        assert_eq!(ProfileImage::Banner.field_name(), "profileCover");
        assert_eq!(ProfileImage::Picture.column(), "profile_picture_src");
    }
}
