//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use mediadesk_api::auth::AuthError;
use mediadesk_api::error::AppError;
use mediadesk_core::error::CoreError;

/// Helper: convert an `AppError` into its status code, headers and parsed JSON body.
async fn error_to_response(
    err: AppError,
) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, headers, json)
}

#[tokio::test]
async fn not_found_names_entity_and_key() {
    let err = AppError::Core(CoreError::not_found("Project", "PRJ-404"));

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Project 'PRJ-404' not found");
}

#[tokio::test]
async fn validation_error_returns_422() {
    let err = AppError::Core(CoreError::Validation("Cannot sort by 'secret'".into()));

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Cannot sort by 'secret'");
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("duplicate wilkins id".into()));

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn forbidden_error_returns_403() {
    let err = AppError::Core(CoreError::Forbidden("locked".into()));

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
    assert_eq!(json["error"], "locked");
}

#[tokio::test]
async fn auth_errors_are_401_with_bearer_challenge() {
    let cases = [
        (AuthError::InvalidCredentials, "INVALID_CREDENTIALS"),
        (AuthError::Unauthenticated, "UNAUTHENTICATED"),
        (AuthError::TokenExpired, "TOKEN_EXPIRED"),
        (AuthError::TokenInvalid("bad signature".into()), "TOKEN_INVALID"),
        (AuthError::KeyFetch("connection refused".into()), "TOKEN_INVALID"),
    ];

    for (err, code) in cases {
        let (status, headers, json) = error_to_response(AppError::Auth(err)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(headers.get("www-authenticate").unwrap(), "Bearer");
        assert_eq!(json["code"], code);
    }
}

#[tokio::test]
async fn token_details_are_not_leaked() {
    let err = AppError::Auth(AuthError::KeyFetch("dns error for login.example".into()));

    let (_, _, json) = error_to_response(err).await;

    assert_eq!(json["error"], "Could not validate credentials");
}

#[tokio::test]
async fn internal_errors_are_sanitized() {
    let err = AppError::InternalError("pool exhausted at 10.0.0.3".into());

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn row_not_found_maps_to_404() {
    let (status, _, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}
