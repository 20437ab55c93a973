//! Handlers for submissions scoped to a project:
//! `/projects/{wilkins_id}/submissions`, bulk selection and the per-project
//! autocomplete lookups.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use mediadesk_core::error::CoreError;
use mediadesk_core::selection::SelectionStats;
use mediadesk_db::models::submission::{
    CreateSubmission, SelectSubmissions, SubmissionListItem, SubmissionOut, UpdateSubmission,
};
use mediadesk_db::repositories::{LookupColumn, SubmissionRepo, UpsertOutcome, VendorRepo};

use super::project::load_project;
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::auth::AuthUser;
use crate::query::{LookupParams, SubmissionListParams};
use crate::response::Page;
use crate::state::AppState;

/// GET /api/v1/projects/{wilkins_id}/submissions
///
/// Rows with an image reference carry a signed, expiring `image_url` when
/// blob storage is configured.
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(wilkins_id): Path<String>,
    ApiQuery(params): ApiQuery<SubmissionListParams>,
) -> AppResult<Json<Page<SubmissionListItem>>> {
    let filter = params.into_filter()?;
    let project = load_project(&state, &wilkins_id).await?;
    let (rows, total_records) = SubmissionRepo::list(&state.pool, project.id, &filter).await?;

    let data = rows
        .into_iter()
        .map(|row| {
            let image_url = match (&state.image_signer, &row.submission.image_id) {
                (Some(signer), Some(image_id)) => Some(signer.signed_url(image_id)),
                _ => None,
            };
            SubmissionListItem::new(row, image_url)
        })
        .collect();

    Ok(Json(Page {
        data,
        total_records,
    }))
}

/// POST /api/v1/projects/{wilkins_id}/submissions
///
/// Create the submission or update the one with the same unit id. The
/// automation caller gets 403 when a person has already edited the row.
pub async fn upsert(
    State(state): State<AppState>,
    user: AuthUser,
    Path(wilkins_id): Path<String>,
    ApiJson(input): ApiJson<CreateSubmission>,
) -> AppResult<(StatusCode, Json<SubmissionOut>)> {
    let project = load_project(&state, &wilkins_id).await?;
    let outcome = SubmissionRepo::upsert(
        &state.pool,
        project.id,
        &input,
        user.identity.may_overwrite_locked(),
    )
    .await?;

    let row = match outcome {
        UpsertOutcome::Created(row) => {
            tracing::info!(
                unit_id = %input.unit_id,
                wilkins_id = %wilkins_id,
                "Submission created"
            );
            row
        }
        UpsertOutcome::Updated(row) => {
            tracing::debug!(
                unit_id = %input.unit_id,
                wilkins_id = %wilkins_id,
                "Submission updated"
            );
            row
        }
        UpsertOutcome::Locked => {
            tracing::warn!(
                unit_id = %input.unit_id,
                caller = %user.identity.log_label(),
                "Refused overwrite of user-locked submission"
            );
            return Err(AppError::Core(CoreError::Forbidden(format!(
                "Submission '{}' has been edited by a user and cannot be overwritten",
                input.unit_id
            ))));
        }
    };

    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PATCH /api/v1/projects/{wilkins_id}/submissions/{unit_id}
///
/// Partial update; also marks the submission user-locked.
pub async fn patch(
    State(state): State<AppState>,
    user: AuthUser,
    Path((wilkins_id, unit_id)): Path<(String, String)>,
    ApiJson(input): ApiJson<UpdateSubmission>,
) -> AppResult<Json<SubmissionOut>> {
    let project = load_project(&state, &wilkins_id).await?;
    let row = SubmissionRepo::patch(&state.pool, project.id, &unit_id, &input)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Submission", &unit_id)))?;

    tracing::info!(unit_id = %unit_id, caller = %user.identity.log_label(), "Submission edited");
    Ok(Json(row.into()))
}

/// PUT /api/v1/projects/{wilkins_id}/select-submissions
///
/// Set the selection flag on the listed unit ids and return the resulting
/// statistics. Unknown unit ids are ignored.
pub async fn select(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(wilkins_id): Path<String>,
    ApiJson(input): ApiJson<SelectSubmissions>,
) -> AppResult<Json<SelectionStats>> {
    let project = load_project(&state, &wilkins_id).await?;
    let stats =
        SubmissionRepo::set_selection(&state.pool, project.id, &input.unit_ids, input.selected)
            .await?;
    Ok(Json(stats))
}

/// GET /api/v1/projects/{wilkins_id}/submission-media-types
pub async fn media_types(
    state: State<AppState>,
    user: AuthUser,
    path: Path<String>,
    query: ApiQuery<LookupParams>,
) -> AppResult<Json<Vec<String>>> {
    lookup(state, user, path, query, LookupColumn::MediaType).await
}

/// GET /api/v1/projects/{wilkins_id}/submission-locations
pub async fn locations(
    state: State<AppState>,
    user: AuthUser,
    path: Path<String>,
    query: ApiQuery<LookupParams>,
) -> AppResult<Json<Vec<String>>> {
    lookup(state, user, path, query, LookupColumn::Town).await
}

/// GET /api/v1/projects/{wilkins_id}/submission-states
pub async fn states(
    state: State<AppState>,
    user: AuthUser,
    path: Path<String>,
    query: ApiQuery<LookupParams>,
) -> AppResult<Json<Vec<String>>> {
    lookup(state, user, path, query, LookupColumn::State).await
}

/// GET /api/v1/projects/{wilkins_id}/submission-vendors
///
/// Vendors linked to the project; location or media filters keep only those
/// with a matching submission.
pub async fn vendors(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(wilkins_id): Path<String>,
    ApiQuery(params): ApiQuery<LookupParams>,
) -> AppResult<Json<Vec<String>>> {
    let project = load_project(&state, &wilkins_id).await?;
    let names = VendorRepo::names_for_project(&state.pool, project.id, &params.into()).await?;
    Ok(Json(names))
}

async fn lookup(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(wilkins_id): Path<String>,
    ApiQuery(params): ApiQuery<LookupParams>,
    column: LookupColumn,
) -> AppResult<Json<Vec<String>>> {
    let project = load_project(&state, &wilkins_id).await?;
    let values =
        SubmissionRepo::distinct_values(&state.pool, project.id, column, &params.into()).await?;
    Ok(Json(values))
}
