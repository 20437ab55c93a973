//! Route definitions for the `/projects` resource.
//!
//! Also mounts the project-scoped submission routes under
//! `/projects/{wilkins_id}/...`.

use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::handlers::{project, submission};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                                        -> list
/// POST   /                                        -> create
/// GET    /clients                                 -> clients
/// GET    /vendors                                 -> vendor_names
/// GET    /{wilkins_id}                            -> get_by_id
/// PUT    /{wilkins_id}                            -> update
/// GET    /{wilkins_id}/stats                      -> stats
/// POST   /{wilkins_id}/vendors                    -> register_vendor
/// POST   /{wilkins_id}/users                      -> provision_user
///
/// GET    /{wilkins_id}/submissions                -> submission::list
/// POST   /{wilkins_id}/submissions                -> submission::upsert
/// PATCH  /{wilkins_id}/submissions/{unit_id}      -> submission::patch
/// PUT    /{wilkins_id}/select-submissions         -> submission::select
/// GET    /{wilkins_id}/submission-media-types     -> submission::media_types
/// GET    /{wilkins_id}/submission-locations       -> submission::locations
/// GET    /{wilkins_id}/submission-states          -> submission::states
/// GET    /{wilkins_id}/submission-vendors         -> submission::vendors
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/clients", get(project::clients))
        .route("/vendors", get(project::vendor_names))
        .route("/{wilkins_id}", get(project::get_by_id).put(project::update))
        .route("/{wilkins_id}/stats", get(project::stats))
        .route("/{wilkins_id}/vendors", post(project::register_vendor))
        .route("/{wilkins_id}/users", post(project::provision_user))
        // Submissions
        .route(
            "/{wilkins_id}/submissions",
            get(submission::list).post(submission::upsert),
        )
        .route(
            "/{wilkins_id}/submissions/{unit_id}",
            patch(submission::patch),
        )
        .route("/{wilkins_id}/select-submissions", put(submission::select))
        // Lookups
        .route(
            "/{wilkins_id}/submission-media-types",
            get(submission::media_types),
        )
        .route(
            "/{wilkins_id}/submission-locations",
            get(submission::locations),
        )
        .route("/{wilkins_id}/submission-states", get(submission::states))
        .route("/{wilkins_id}/submission-vendors", get(submission::vendors))
}
