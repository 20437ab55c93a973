//! Handlers for the `/auth` resource (sign-in and OAuth2 password grant).

use axum::extract::State;
use axum::{Form, Json};
use mediadesk_db::models::user::{User, UserInfo};
use mediadesk_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::auth::AuthError;
use crate::error::{AppError, AppResult};
use crate::extract::ApiJson;
use crate::state::AppState;

const TOKEN_TYPE: &str = "bearer";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/sign-in`.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Form body for `POST /auth/token` (OAuth2 password grant). `username`
/// carries the e-mail address; other grant fields are accepted and ignored.
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
    pub grant_type: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/sign-in
///
/// Authenticate with e-mail + password. Returns a session token and the
/// user's summary.
pub async fn sign_in(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SignInRequest>,
) -> AppResult<Json<SignInResponse>> {
    let user = check_credentials(&state, &input.email, &input.password).await?;
    let access_token = issue_token(&state, &user)?;

    tracing::info!(user_id = user.id, "User signed in");

    Ok(Json(SignInResponse {
        access_token,
        token_type: TOKEN_TYPE,
        user: UserInfo::from(&user),
    }))
}

/// POST /api/v1/auth/token
///
/// Form-encoded password grant for OAuth2 clients.
pub async fn token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> AppResult<Json<TokenResponse>> {
    if let Some(grant) = form.grant_type.as_deref() {
        tracing::debug!(grant_type = grant, scope = ?form.scope, "Token request");
    }

    let user = check_credentials(&state, &form.username, &form.password).await?;
    let access_token = issue_token(&state, &user)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: TOKEN_TYPE,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Look up the user by e-mail and verify the password.
///
/// Unknown e-mail and wrong password are indistinguishable to the caller.
async fn check_credentials(state: &AppState, email: &str, password: &str) -> AppResult<User> {
    let Some(user) = UserRepo::find_by_email(&state.pool, email).await? else {
        tracing::warn!("Sign-in for unknown e-mail");
        return Err(AuthError::InvalidCredentials.into());
    };

    let password_valid = verify_password(password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        tracing::warn!(user_id = user.id, "Sign-in with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(user)
}

fn issue_token(state: &AppState, user: &User) -> AppResult<String> {
    generate_access_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))
}
