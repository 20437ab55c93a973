//! Request extractors that reject with the API's JSON error body.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use mediadesk_core::error::CoreError;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// JSON body that has been deserialized and then passed its `validator` rules.
///
/// Malformed JSON, wrong types, unknown fields and failed field rules all
/// reject with `VALIDATION_ERROR` before the handler runs.
///
/// ```ignore
/// async fn create(ApiJson(input): ApiJson<CreateProject>) -> AppResult<Json<ProjectOut>> {
///     // input is well-formed here
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| CoreError::Validation(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| CoreError::Validation(errors.to_string()))?;

        Ok(ApiJson(value))
    }
}

/// Query string deserialized into `T`.
///
/// Wrong types such as `?limit=abc` reject with `VALIDATION_ERROR` instead of
/// axum's plain-text 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| CoreError::Validation(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}
