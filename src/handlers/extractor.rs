//! JSON extractor that reports body errors as `AppError`
//!
//! Axum's `Json` rejects well-formed JSON that fails validation with 422. The
//! API treats every unusable request body as a bad request, so rejections are
//! mapped to `AppError::Validation` (400), or `AppError::UnsupportedMediaType`
//! (415) for a missing content type.

use crate::error::AppError;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

/// `Json` replacement used by the API handlers
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                AppError::UnsupportedMediaType("Content-Type must be application/json".to_string())
            }
            rejection => AppError::Validation(rejection.body_text()),
        }
    }
}

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected request body");
                Err(rejection.into())
            }
        }
    }
}
