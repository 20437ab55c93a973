//! Join rows: project <-> vendor and user <-> project.

use mediadesk_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from `project_vendors`. Each (project, vendor) pair exists at most once.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectVendor {
    pub id: DbId,
    pub project_id: DbId,
    pub vendor_id: DbId,
    pub created_at: Timestamp,
}

/// A row from `user_projects`. Each (user, project) pair exists at most once.
#[derive(Debug, Clone, FromRow)]
pub struct UserProject {
    pub id: DbId,
    pub user_id: DbId,
    pub project_id: DbId,
    pub created_at: Timestamp,
}
