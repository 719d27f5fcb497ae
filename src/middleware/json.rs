//! JSON body extractor whose rejections use the API error envelope.

use axum::{
    body::Bytes,
    extract::{FromRequest, OptionalFromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// Like [`axum::Json`], but malformed or incomplete bodies become a 400
/// `VALIDATION_ERROR` instead of axum's plain-text 422.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match <Json<T> as FromRequest<S>>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

/// `Option<ApiJson<T>>`: an empty body is `None`, anything else must parse.
impl<S, T> OptionalFromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        if bytes.is_empty() {
            return Ok(None);
        }
        match Json::<T>::from_bytes(&bytes) {
            Ok(Json(value)) => Ok(Some(ApiJson(value))),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Confirm {
        password: Option<String>,
    }

    fn request(body: &'static str) -> Request {
        Request::builder()
            .method("DELETE")
            .uri("/users")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn optional(body: &'static str) -> Result<Option<ApiJson<Confirm>>, AppError> {
        <ApiJson<Confirm> as OptionalFromRequest<()>>::from_request(request(body), &()).await
    }

    #[tokio::test]
    async fn empty_optional_body_is_none() {
        assert!(optional("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn present_optional_body_is_parsed() {
        let ApiJson(confirm) = optional(r#"{"password":"hunter22"}"#).await.unwrap().unwrap();
        assert_eq!(confirm.password.as_deref(), Some("hunter22"));
    }

    #[tokio::test]
    async fn malformed_optional_body_is_a_validation_error() {
        let err = optional("{not json").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn required_body_still_rejects_garbage() {
        let err = <ApiJson<Confirm> as FromRequest<()>>::from_request(request("[1,"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
