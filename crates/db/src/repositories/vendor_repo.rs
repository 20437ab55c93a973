//! Repository for the `vendors` table.

use mediadesk_core::search::{contains_pattern, normalize_term, LOOKUP_LIMIT};
use mediadesk_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::submission::LookupFilter;
use crate::models::vendor::{RegisterVendor, Vendor};
use crate::repositories::crud::Entity;
use crate::repositories::link_repo::ProjectVendorRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, emails, created_at, updated_at";

impl Entity for Vendor {
    const TABLE: &'static str = "vendors";
    const COLUMNS: &'static str = COLUMNS;
}

/// Provides CRUD operations for vendors.
pub struct VendorRepo;

impl VendorRepo {
    /// Find a vendor by its unique name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Vendor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vendors WHERE name = $1");
        sqlx::query_as::<_, Vendor>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Return the vendor called `name`, inserting it with `emails` if absent.
    ///
    /// An existing vendor keeps its stored contacts. `ON CONFLICT DO NOTHING`
    /// waits out a concurrent insert of the same name, so the follow-up
    /// select always sees exactly one row.
    pub async fn find_or_create(
        conn: &mut PgConnection,
        name: &str,
        emails: &[String],
    ) -> Result<Vendor, sqlx::Error> {
        sqlx::query(
            "INSERT INTO vendors (name, emails) VALUES ($1, $2)
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(emails)
        .execute(&mut *conn)
        .await?;

        let query = format!("SELECT {COLUMNS} FROM vendors WHERE name = $1");
        sqlx::query_as::<_, Vendor>(&query)
            .bind(name)
            .fetch_one(&mut *conn)
            .await
    }

    /// Ensure a vendor exists and is linked to the project, in one transaction.
    pub async fn register_for_project(
        pool: &PgPool,
        project_id: DbId,
        input: &RegisterVendor,
    ) -> Result<Vendor, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let vendor = Self::find_or_create(&mut *tx, &input.name, &input.emails).await?;
        ProjectVendorRepo::link(&mut *tx, project_id, vendor.id).await?;
        tx.commit().await?;
        Ok(vendor)
    }

    /// Distinct vendor names across all projects, for autocomplete.
    pub async fn list_names(
        pool: &PgPool,
        search: Option<&str>,
    ) -> Result<Vec<String>, sqlx::Error> {
        let pattern = normalize_term(search).map(contains_pattern);
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM vendors
             WHERE ($1::TEXT IS NULL OR name ILIKE $1)
             ORDER BY name
             LIMIT $2",
        )
        .bind(pattern)
        .bind(LOOKUP_LIMIT)
        .fetch_all(pool)
        .await
    }

    /// Names of vendors linked to a project, for autocomplete.
    ///
    /// When any of state, town or media type is given, only vendors with a
    /// matching submission in the project are returned.
    pub async fn names_for_project(
        pool: &PgPool,
        project_id: DbId,
        filter: &LookupFilter,
    ) -> Result<Vec<String>, sqlx::Error> {
        let pattern = normalize_term(filter.search.as_deref()).map(contains_pattern);
        sqlx::query_scalar::<_, String>(
            "SELECT v.name FROM vendors v
             JOIN project_vendors pv ON pv.vendor_id = v.id
             WHERE pv.project_id = $1
               AND ($2::TEXT IS NULL OR v.name ILIKE $2)
               AND (($3::TEXT IS NULL AND $4::TEXT IS NULL AND $5::TEXT IS NULL)
                    OR EXISTS (
                        SELECT 1 FROM submissions s
                        WHERE s.project_id = pv.project_id AND s.vendor_id = v.id
                          AND ($3::TEXT IS NULL OR s.state = $3)
                          AND ($4::TEXT IS NULL OR s.town = $4)
                          AND ($5::TEXT IS NULL OR s.media_type = $5)))
             ORDER BY v.name
             LIMIT $6",
        )
        .bind(project_id)
        .bind(pattern)
        .bind(&filter.state)
        .bind(&filter.town)
        .bind(&filter.media_type)
        .bind(LOOKUP_LIMIT)
        .fetch_all(pool)
        .await
    }
}
