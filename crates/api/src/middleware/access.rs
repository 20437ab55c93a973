//! Caller-kind extractors layered on [`AuthUser`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mediadesk_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the automation identity. Rejects people with 403 Forbidden.
///
/// ```ignore
/// async fn provision(RequireService(caller): RequireService) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireService(pub AuthUser);

impl FromRequestParts<AppState> for RequireService {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.identity.is_service() {
            tracing::warn!(caller = %user.identity.log_label(), "Service-only endpoint refused");
            return Err(AppError::Core(CoreError::Forbidden(
                "Service credentials required".into(),
            )));
        }
        Ok(RequireService(user))
    }
}
