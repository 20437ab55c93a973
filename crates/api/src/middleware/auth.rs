//! Bearer-token authentication extractor for Axum handlers.
//!
//! Two token families are accepted:
//!
//! - Locally issued HS256 tokens (see [`crate::auth::jwt`]). A person's token
//!   names a user id that must still exist; a service token carries the
//!   shared API key, which must match `SERVICE_API_KEY` exactly.
//! - Identity-provider tokens, recognised by a `kid` header and an asymmetric
//!   algorithm, verified by [`crate::auth::federated::FederatedVerifier`].

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode_header, Algorithm};
use mediadesk_core::identity::{Identity, InteractiveUser, UserRef};
use mediadesk_core::types::DbId;
use mediadesk_db::repositories::UserRepo;

use crate::auth::jwt::validate_token;
use crate::auth::AuthError;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller of a request.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(caller = %user.identity.log_label(), "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: Identity,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        match authenticate(state, token).await {
            Ok(identity) => Ok(AuthUser { identity }),
            Err(AppError::Auth(err)) => {
                tracing::warn!(
                    error = %err,
                    path = %parts.uri.path(),
                    "Rejected request credentials"
                );
                Err(AppError::Auth(err))
            }
            Err(other) => Err(other),
        }
    }
}

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::Unauthenticated)
}

/// Resolve a bearer token to the caller it identifies.
pub async fn authenticate(state: &AppState, token: &str) -> Result<Identity, AppError> {
    let header = decode_header(token).map_err(AuthError::from)?;

    if header.kid.is_some() && !is_hmac(header.alg) {
        let verifier = state.federated.as_ref().ok_or_else(|| {
            AuthError::TokenInvalid("federated tokens are not accepted".into())
        })?;
        return Ok(verifier.verify(token).await?);
    }

    let claims = validate_token(token, &state.config.jwt).map_err(AuthError::from)?;

    if claims.service {
        return match state.config.service_api_key.as_deref() {
            Some(key) if key == claims.sub => Ok(Identity::Service),
            _ => Err(AuthError::InvalidCredentials.into()),
        };
    }

    let user_id: DbId = claims
        .sub
        .parse()
        .map_err(|_| AuthError::TokenInvalid("subject is not a user id".into()))?;

    let user = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    Ok(Identity::Interactive(InteractiveUser {
        id: UserRef::Local(user.id),
        name: Some(user.name),
        email: Some(user.email),
        is_admin: user.is_admin,
    }))
}

fn is_hmac(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}
