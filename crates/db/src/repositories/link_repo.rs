//! Repositories for the `project_vendors` and `user_projects` join tables.
//!
//! Links are idempotent: creating an existing pair is a no-op that still
//! returns the stored row.

use mediadesk_core::types::DbId;
use sqlx::PgConnection;

use crate::models::link::{ProjectVendor, UserProject};
use crate::repositories::crud::Entity;

const PROJECT_VENDOR_COLUMNS: &str = "id, project_id, vendor_id, created_at";
const USER_PROJECT_COLUMNS: &str = "id, user_id, project_id, created_at";

impl Entity for ProjectVendor {
    const TABLE: &'static str = "project_vendors";
    const COLUMNS: &'static str = PROJECT_VENDOR_COLUMNS;
}

impl Entity for UserProject {
    const TABLE: &'static str = "user_projects";
    const COLUMNS: &'static str = USER_PROJECT_COLUMNS;
}

pub struct ProjectVendorRepo;

impl ProjectVendorRepo {
    /// Link a vendor to a project unless the pair already exists.
    pub async fn link(
        conn: &mut PgConnection,
        project_id: DbId,
        vendor_id: DbId,
    ) -> Result<ProjectVendor, sqlx::Error> {
        sqlx::query(
            "INSERT INTO project_vendors (project_id, vendor_id)
             VALUES ($1, $2)
             ON CONFLICT (project_id, vendor_id) DO NOTHING",
        )
        .bind(project_id)
        .bind(vendor_id)
        .execute(&mut *conn)
        .await?;

        let query = format!(
            "SELECT {PROJECT_VENDOR_COLUMNS} FROM project_vendors
             WHERE project_id = $1 AND vendor_id = $2"
        );
        sqlx::query_as::<_, ProjectVendor>(&query)
            .bind(project_id)
            .bind(vendor_id)
            .fetch_one(&mut *conn)
            .await
    }
}

pub struct UserProjectRepo;

impl UserProjectRepo {
    /// Grant a user access to a project unless the pair already exists.
    pub async fn link(
        conn: &mut PgConnection,
        user_id: DbId,
        project_id: DbId,
    ) -> Result<UserProject, sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_projects (user_id, project_id)
             VALUES ($1, $2)
             ON CONFLICT (user_id, project_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(project_id)
        .execute(&mut *conn)
        .await?;

        let query = format!(
            "SELECT {USER_PROJECT_COLUMNS} FROM user_projects
             WHERE user_id = $1 AND project_id = $2"
        );
        sqlx::query_as::<_, UserProject>(&query)
            .bind(user_id)
            .bind(project_id)
            .fetch_one(&mut *conn)
            .await
    }
}
