pub mod auth;
pub mod health;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/sign-in                                          sign-in (public)
/// /auth/token                                            OAuth2 password grant (public)
///
/// /projects                                              list, create
/// /projects/clients                                      client autocomplete
/// /projects/vendors                                      vendor autocomplete
/// /projects/{wilkins_id}                                 get, update
/// /projects/{wilkins_id}/stats                           selection + project totals
/// /projects/{wilkins_id}/vendors                         register vendor (POST)
/// /projects/{wilkins_id}/users                           provision user (POST, service only)
/// /projects/{wilkins_id}/submissions                     list, upsert
/// /projects/{wilkins_id}/submissions/{unit_id}           partial update (PATCH)
/// /projects/{wilkins_id}/select-submissions              bulk select (PUT)
/// /projects/{wilkins_id}/submission-media-types          lookup
/// /projects/{wilkins_id}/submission-locations            lookup
/// /projects/{wilkins_id}/submission-states               lookup
/// /projects/{wilkins_id}/submission-vendors              lookup
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
}
