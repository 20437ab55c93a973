//! Handlers for the `/projects` resource and its project-level sub-resources
//! (stats, vendor registration, user provisioning, lookups).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use mediadesk_core::error::CoreError;
use mediadesk_db::models::project::{
    CreateProject, Project, ProjectOut, ProjectStats, ProjectSummary, UpdateProject,
};
use mediadesk_db::models::user::{CreateUser, ProvisionUser, UserOut};
use mediadesk_db::models::vendor::{RegisterVendor, VendorOut};
use mediadesk_db::repositories::{ProjectRepo, SubmissionRepo, UserRepo, VendorRepo};

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::access::RequireService;
use crate::middleware::auth::AuthUser;
use crate::query::{LookupParams, ProjectListParams};
use crate::response::Page;
use crate::state::AppState;

/// Load a project by its external id or fail with 404.
pub(crate) async fn load_project(state: &AppState, wilkins_id: &str) -> AppResult<Project> {
    ProjectRepo::find_by_wilkins_id(&state.pool, wilkins_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Project", wilkins_id)))
}

/// GET /api/v1/projects
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(params): ApiQuery<ProjectListParams>,
) -> AppResult<Json<Page<ProjectSummary>>> {
    let filter = params.into_filter()?;
    let (data, total_records) = ProjectRepo::list(&state.pool, &filter).await?;
    Ok(Json(Page {
        data,
        total_records,
    }))
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<CreateProject>,
) -> AppResult<(StatusCode, Json<ProjectOut>)> {
    let project = ProjectRepo::create(&state.pool, &input).await?;
    tracing::info!(
        wilkins_id = %project.wilkins_id,
        caller = %user.identity.log_label(),
        "Project created"
    );
    Ok((StatusCode::CREATED, Json(project.into())))
}

/// GET /api/v1/projects/{wilkins_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(wilkins_id): Path<String>,
) -> AppResult<Json<ProjectOut>> {
    let project = load_project(&state, &wilkins_id).await?;
    Ok(Json(project.into()))
}

/// PUT /api/v1/projects/{wilkins_id}
pub async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(wilkins_id): Path<String>,
    ApiJson(input): ApiJson<UpdateProject>,
) -> AppResult<Json<ProjectOut>> {
    let project = ProjectRepo::update(&state.pool, &wilkins_id, &input)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Project", &wilkins_id)))?;
    Ok(Json(project.into()))
}

/// GET /api/v1/projects/{wilkins_id}/stats
pub async fn stats(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(wilkins_id): Path<String>,
) -> AppResult<Json<ProjectStats>> {
    let project = load_project(&state, &wilkins_id).await?;
    let counts = ProjectRepo::counts(&state.pool, project.id).await?;
    let selection = SubmissionRepo::selection_stats(&state.pool, project.id).await?;
    Ok(Json(ProjectStats::new(&project, counts, selection)))
}

/// POST /api/v1/projects/{wilkins_id}/vendors
///
/// Register a vendor under the project, creating the vendor when its name is
/// new. Registering an already-linked vendor is a no-op.
pub async fn register_vendor(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(wilkins_id): Path<String>,
    ApiJson(input): ApiJson<RegisterVendor>,
) -> AppResult<(StatusCode, Json<VendorOut>)> {
    let project = load_project(&state, &wilkins_id).await?;
    let vendor = VendorRepo::register_for_project(&state.pool, project.id, &input).await?;
    Ok((StatusCode::CREATED, Json(vendor.into())))
}

/// POST /api/v1/projects/{wilkins_id}/users
///
/// Service-only: create the user when the e-mail is new and grant access to
/// the project. An existing account keeps its password.
pub async fn provision_user(
    State(state): State<AppState>,
    RequireService(_caller): RequireService,
    Path(wilkins_id): Path<String>,
    ApiJson(input): ApiJson<ProvisionUser>,
) -> AppResult<(StatusCode, Json<UserOut>)> {
    let project = load_project(&state, &wilkins_id).await?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let create = CreateUser {
        name: input.name,
        email: input.email,
        password_hash,
        is_admin: input.is_admin.unwrap_or(false),
    };

    let user = UserRepo::provision_for_project(&state.pool, project.id, &create).await?;
    tracing::info!(user_id = user.id, wilkins_id = %wilkins_id, "User provisioned onto project");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/v1/projects/clients?search=
pub async fn clients(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(params): ApiQuery<LookupParams>,
) -> AppResult<Json<Vec<String>>> {
    let clients = ProjectRepo::distinct_clients(&state.pool, params.search.as_deref()).await?;
    Ok(Json(clients))
}

/// GET /api/v1/projects/vendors?search=
pub async fn vendor_names(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(params): ApiQuery<LookupParams>,
) -> AppResult<Json<Vec<String>>> {
    let names = VendorRepo::list_names(&state.pool, params.search.as_deref()).await?;
    Ok(Json(names))
}
