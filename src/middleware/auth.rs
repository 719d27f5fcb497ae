//! Identity resolution for every request, and the login-required extractor.
//!
//! A missing `Authorization` header resolves to [`Identity::Anonymous`]. A
//! header that is present but does not hold a valid, unexpired access token
//! ends the request with 401, whatever the route.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::services::auth::{self as auth_service, TokenPurpose};
use crate::AppState;

/// The resolved actor of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    User(i64),
}

impl Identity {
    pub fn user_id(self) -> Option<i64> {
        match self {
            Identity::Anonymous => None,
            Identity::User(id) => Some(id),
        }
    }

    /// Login gate: anonymous callers are rejected with 401.
    pub fn require_login(self) -> Result<i64, AppError> {
        self.user_id().ok_or(AppError::Unauthorized)
    }
}

/// Resolve the identity carried by the request headers.
///
/// The header holds the raw token; a `Bearer ` prefix is tolerated.
pub fn resolve(headers: &HeaderMap, jwt_secret: &str) -> Result<Identity, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(Identity::Anonymous);
    };

    let raw = value.to_str().map_err(|_| AppError::Unauthorized)?.trim();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }

    let claims = auth_service::validate_token(token, jwt_secret, TokenPurpose::Access)?;
    Ok(Identity::User(claims.user_id()?))
}

/// Middleware attaching the resolved [`Identity`] to the request extensions.
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = resolve(request.headers(), &state.config.jwt_secret).inspect_err(|_| {
        tracing::debug!(path = %request.uri().path(), "Rejected request with invalid token");
    })?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(identity) => Ok(*identity),
            None => resolve(&parts.headers, &state.config.jwt_secret),
        }
    }
}

/// Authenticated user. Use as an extractor in handlers that require login:
/// ```ignore
/// async fn handler(current_user: CurrentUser) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        Ok(CurrentUser {
            id: identity.require_login()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "identity-test-secret";

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_anonymous() {
        let identity = resolve(&HeaderMap::new(), SECRET).unwrap();
        assert_eq!(identity, Identity::Anonymous);
        assert!(identity.require_login().unwrap_err().is_unauthorized());
    }

    #[test]
    fn raw_and_bearer_tokens_resolve() {
        let token = auth_service::issue_token(12, TokenPurpose::Access, SECRET, 600).unwrap();
        assert_eq!(resolve(&headers(&token), SECRET).unwrap(), Identity::User(12));
        assert_eq!(
            resolve(&headers(&format!("Bearer {token}")), SECRET).unwrap(),
            Identity::User(12)
        );
    }

    #[test]
    fn bad_token_is_terminal_not_anonymous() {
        assert!(resolve(&headers("not-a-token"), SECRET)
            .unwrap_err()
            .is_unauthorized());
        assert!(resolve(&headers("Bearer "), SECRET).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = auth_service::issue_token(12, TokenPurpose::Access, SECRET, -3600).unwrap();
        assert!(resolve(&headers(&token), SECRET).is_err());
    }

    #[test]
    fn email_tokens_are_not_access_tokens() {
        let token =
            auth_service::issue_token(12, TokenPurpose::VerifyEmail, SECRET, 600).unwrap();
        assert!(resolve(&headers(&token), SECRET).is_err());
    }
}
