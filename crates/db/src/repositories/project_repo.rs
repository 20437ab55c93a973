//! Repository for the `projects` table.

use mediadesk_core::search::{contains_pattern, normalize_term, LOOKUP_LIMIT};
use mediadesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{
    CreateProject, Project, ProjectCounts, ProjectFilter, ProjectSummary, UpdateProject,
};
use crate::repositories::crud::Entity;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, wilkins_id, name, client, status, budget, created_at, updated_at";

impl Entity for Project {
    const TABLE: &'static str = "projects";
    const COLUMNS: &'static str = COLUMNS;
}

/// `WHERE` body shared by the listing page and its count.
///
/// `$1` statuses (empty = any), `$2` client, `$3` vendor name, `$4` search
/// pattern. Vendor name matching goes through the project's vendor links.
const LIST_FILTER: &str = "(cardinality($1::TEXT[]) = 0 OR p.status = ANY($1))
       AND ($2::TEXT IS NULL OR p.client = $2)
       AND ($3::TEXT IS NULL OR EXISTS (
            SELECT 1 FROM project_vendors pv JOIN vendors v ON v.id = pv.vendor_id
            WHERE pv.project_id = p.id AND v.name = $3))
       AND ($4::TEXT IS NULL
            OR p.wilkins_id ILIKE $4
            OR p.name ILIKE $4
            OR p.client ILIKE $4
            OR EXISTS (
                SELECT 1 FROM project_vendors pv JOIN vendors v ON v.id = pv.vendor_id
                WHERE pv.project_id = p.id AND v.name ILIKE $4))";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    ///
    /// If `status` is `None` in the input, defaults to `active`.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (wilkins_id, name, client, status, budget)
             VALUES ($1, $2, $3, COALESCE($4, 'active'), $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.wilkins_id)
            .bind(&input.name)
            .bind(&input.client)
            .bind(input.status.map(|s| s.as_str()))
            .bind(input.budget)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its external business id.
    pub async fn find_by_wilkins_id(
        pool: &PgPool,
        wilkins_id: &str,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE wilkins_id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(wilkins_id)
            .fetch_optional(pool)
            .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no project has the given external id.
    pub async fn update(
        pool: &PgPool,
        wilkins_id: &str,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($2, name),
                client = COALESCE($3, client),
                status = COALESCE($4, status),
                budget = COALESCE($5, budget)
             WHERE wilkins_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(wilkins_id)
            .bind(&input.name)
            .bind(&input.client)
            .bind(input.status.map(|s| s.as_str()))
            .bind(input.budget)
            .fetch_optional(pool)
            .await
    }

    /// One page of projects, newest first, plus the total number of matches.
    pub async fn list(
        pool: &PgPool,
        filter: &ProjectFilter,
    ) -> Result<(Vec<ProjectSummary>, i64), sqlx::Error> {
        let statuses: Vec<&str> = filter.statuses.iter().map(|s| s.as_str()).collect();
        let pattern = normalize_term(filter.search.as_deref()).map(contains_pattern);

        let count_query = format!("SELECT COUNT(*) FROM projects p WHERE {LIST_FILTER}");
        let total = sqlx::query_scalar::<_, i64>(&count_query)
            .bind(&statuses)
            .bind(&filter.client)
            .bind(&filter.vendor)
            .bind(&pattern)
            .fetch_one(pool)
            .await?;

        let page_query = format!(
            "SELECT p.wilkins_id, p.name, p.client, p.status, p.budget,
                    ARRAY(SELECT v.name FROM project_vendors pv
                          JOIN vendors v ON v.id = pv.vendor_id
                          WHERE pv.project_id = p.id
                          ORDER BY v.name) AS vendors
             FROM projects p
             WHERE {LIST_FILTER}
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT $5 OFFSET $6"
        );
        let rows = sqlx::query_as::<_, ProjectSummary>(&page_query)
            .bind(&statuses)
            .bind(&filter.client)
            .bind(&filter.vendor)
            .bind(&pattern)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    /// Distinct non-null client names, for autocomplete.
    pub async fn distinct_clients(
        pool: &PgPool,
        search: Option<&str>,
    ) -> Result<Vec<String>, sqlx::Error> {
        let pattern = normalize_term(search).map(contains_pattern);
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT client FROM projects
             WHERE client IS NOT NULL AND ($1::TEXT IS NULL OR client ILIKE $1)
             ORDER BY client
             LIMIT $2",
        )
        .bind(pattern)
        .bind(LOOKUP_LIMIT)
        .fetch_all(pool)
        .await
    }

    /// Vendor link, distinct submitting vendor and submission totals.
    pub async fn counts(pool: &PgPool, project_id: DbId) -> Result<ProjectCounts, sqlx::Error> {
        sqlx::query_as::<_, ProjectCounts>(
            "SELECT
                (SELECT COUNT(*) FROM project_vendors WHERE project_id = $1) AS vendors_in_project,
                (SELECT COUNT(DISTINCT vendor_id) FROM submissions WHERE project_id = $1)
                    AS vendors_in_submission,
                (SELECT COUNT(*) FROM submissions WHERE project_id = $1) AS sites",
        )
        .bind(project_id)
        .fetch_one(pool)
        .await
    }
}
