//! Admin and ownership gates layered on top of identity resolution.
//!
//! The admin flag is read from `users` on every check and never taken from
//! the token, so revoking admin rights applies to the next request.

use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::middleware::auth::CurrentUser;
use crate::AppState;

/// Fresh read of a user's admin flag. `None` when the user no longer exists.
pub async fn admin_flag(pool: &PgPool, user_id: i64) -> Result<Option<bool>, AppError> {
    let flag = sqlx::query_scalar::<_, bool>("SELECT is_admin FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(flag)
}

/// Turn a looked-up admin flag into a decision.
///
/// Unknown users are 404. Strict routes reject non-admins with 403; lenient
/// routes pass through with `false` so the handler can fall back to ownership.
pub fn admin_decision(flag: Option<bool>, strict: bool) -> Result<bool, AppError> {
    match flag {
        None => Err(AppError::NotFound("User not found".to_string())),
        Some(false) if strict => Err(AppError::Forbidden("Admin access required".to_string())),
        Some(is_admin) => Ok(is_admin),
    }
}

/// Extractor that requires the caller to be a site administrator.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        admin_decision(admin_flag(&state.db, user.id).await?, true)?;
        Ok(RequireAdmin(user))
    }
}

/// Logged-in caller plus their admin flag, for routes where the owner of a
/// resource may act without admin rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: i64,
    pub is_admin: bool,
}

impl RequestContext {
    /// Ownership fallback: admins pass, otherwise the caller must be `owner_id`.
    pub fn ensure_owner(&self, owner_id: i64) -> Result<(), AppError> {
        if self.is_admin || self.user_id == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only the owner or an admin may do this".to_string(),
            ))
        }
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        let is_admin = admin_decision(admin_flag(&state.db, user.id).await?, false)?;
        Ok(RequestContext {
            user_id: user.id,
            is_admin,
        })
    }
}

/// Owner of a project, or 404 when it does not exist.
pub async fn project_owner(pool: &PgPool, project_id: i64) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id_user FROM projects WHERE id = $1")
        .bind(project_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}

/// Gate for mutations on a project or its sub-resources (blogs, tiers,
/// images): re-fetches the project and applies the ownership fallback.
pub async fn ensure_project_access(
    pool: &PgPool,
    project_id: i64,
    ctx: &RequestContext,
) -> Result<(), AppError> {
    let owner = project_owner(pool, project_id).await?;
    ctx.ensure_owner(owner).inspect_err(|_| {
        tracing::warn!(
            project_id,
            user_id = ctx.user_id,
            "Rejected mutation by non-owner"
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_user_is_not_found() {
        assert!(admin_decision(None, true).unwrap_err().is_not_found());
        assert!(admin_decision(None, false).unwrap_err().is_not_found());
    }

    #[test]
    fn strict_gate_forbids_non_admin() {
        assert!(admin_decision(Some(false), true).unwrap_err().is_forbidden());
        assert!(admin_decision(Some(true), true).unwrap());
    }

    #[test]
    fn lenient_gate_marks_non_admin() {
        assert!(!admin_decision(Some(false), false).unwrap());
    }

    #[test]
    fn owner_passes_without_admin() {
        let ctx = RequestContext {
            user_id: 5,
            is_admin: false,
        };
        assert!(ctx.ensure_owner(5).is_ok());
    }

    #[test]
    fn other_owner_is_forbidden() {
        let ctx = RequestContext {
            user_id: 5,
            is_admin: false,
        };
        assert!(ctx.ensure_owner(6).unwrap_err().is_forbidden());
    }

    #[test]
    fn admin_overrides_ownership() {
        let ctx = RequestContext {
            user_id: 1,
            is_admin: true,
        };
        assert!(ctx.ensure_owner(99).is_ok());
    }
}
