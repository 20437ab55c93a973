//! Project entity model and DTOs.

use mediadesk_core::project_status::ProjectStatus;
use mediadesk_core::selection::SelectionStats;
use mediadesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A project row from the `projects` table.
///
/// `wilkins_id` is the external business id clients address projects by; it
/// is unique and never changes after creation.
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: DbId,
    pub wilkins_id: String,
    pub name: Option<String>,
    pub client: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ProjectStatus,
    pub budget: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// External representation of a project.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectOut {
    pub wilkins_id: String,
    pub name: Option<String>,
    pub client: Option<String>,
    pub status: ProjectStatus,
    pub budget: Option<f64>,
}

impl From<Project> for ProjectOut {
    fn from(project: Project) -> Self {
        Self {
            wilkins_id: project.wilkins_id,
            name: project.name,
            client: project.client,
            status: project.status,
            budget: project.budget,
        }
    }
}

/// One row of the project listing, with the names of its linked vendors.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectSummary {
    pub wilkins_id: String,
    pub name: Option<String>,
    pub client: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ProjectStatus,
    pub budget: Option<f64>,
    pub vendors: Vec<String>,
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateProject {
    #[validate(length(min = 1, max = 256))]
    pub wilkins_id: String,
    pub name: Option<String>,
    pub client: Option<String>,
    /// Defaults to Active if omitted.
    pub status: Option<ProjectStatus>,
    pub budget: Option<f64>,
}

/// DTO for updating an existing project. All fields are optional; the
/// external id cannot be changed.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub client: Option<String>,
    pub status: Option<ProjectStatus>,
    pub budget: Option<f64>,
}

/// Filters for the project listing.
///
/// All filters combine with AND; `search` matches any one of external id,
/// name, client or linked vendor name.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub statuses: Vec<ProjectStatus>,
    pub client: Option<String>,
    pub vendor: Option<String>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Project-level totals that sit beside the selection statistics.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct ProjectCounts {
    pub vendors_in_project: i64,
    pub vendors_in_submission: i64,
    pub sites: i64,
}

/// Response for `GET /projects/{wilkins_id}/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectStats {
    pub project_name: Option<String>,
    pub vendors_in_project: i64,
    pub vendors_in_submission: i64,
    pub sites: i64,
    pub total_budget: Option<f64>,
    pub selected: i64,
    pub impressions: Option<i64>,
    pub cpm: f64,
    pub estimated_budget: f64,
}

impl ProjectStats {
    pub fn new(project: &Project, counts: ProjectCounts, selection: SelectionStats) -> Self {
        Self {
            project_name: project.name.clone(),
            vendors_in_project: counts.vendors_in_project,
            vendors_in_submission: counts.vendors_in_submission,
            sites: counts.sites,
            total_budget: project.budget,
            selected: selection.selected,
            impressions: selection.impressions,
            cpm: selection.cpm,
            estimated_budget: selection.estimated_budget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_rejects_external_id() {
        let result =
            serde_json::from_str::<UpdateProject>(r#"{"wilkins_id": "PRJ-2", "name": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn create_accepts_status_label() {
        let input: CreateProject = serde_json::from_str(
            r#"{"wilkins_id": "PRJ-1", "status": "Vendor Request Sent", "budget": 1200}"#,
        )
        .unwrap();
        assert_eq!(input.status, Some(ProjectStatus::VendorRequestSent));
        assert_eq!(input.budget, Some(1200.0));
    }

    #[test]
    fn create_requires_non_empty_external_id() {
        let input: CreateProject = serde_json::from_str(r#"{"wilkins_id": ""}"#).unwrap();
        assert!(input.validate().is_err());
    }
}
