//! Repository for the `submissions` table.
//!
//! Besides plain reads this holds the two multi-statement operations that
//! must be atomic: the create-or-update upsert (which may also create the
//! vendor and its project link) and the bulk selection change (which returns
//! statistics computed inside the same transaction).

use mediadesk_core::search::{contains_pattern, normalize_term, prefix_pattern, LOOKUP_LIMIT};
use mediadesk_core::selection::{SelectedUnit, SelectionStats};
use mediadesk_core::types::DbId;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};

use crate::models::submission::{
    ClearedFields, CreateSubmission, LookupFilter, SelectedCostRow, Submission,
    SubmissionFields, SubmissionFilter, SubmissionWithVendor, UpdateSubmission,
};
use crate::repositories::crud::Entity;
use crate::repositories::link_repo::ProjectVendorRepo;
use crate::repositories::vendor_repo::VendorRepo;

/// Client-editable attribute columns, in [`bind_fields`] order.
const FIELD_COLUMNS: &[&str] = &[
    "unit",
    "town",
    "state",
    "market",
    "location_description",
    "geopath_id",
    "target_location",
    "distance_to_location",
    "a18_weekly_impressions",
    "a18_4wk_reach",
    "a18_4wk_freq",
    "size",
    "media_type",
    "facing",
    "is_illuminated",
    "availability_start",
    "availability_end",
    "total_units",
    "one_week_media_cost",
    "two_week_media_cost",
    "three_week_media_cost",
    "four_week_media_cost",
    "installation_cost",
    "markup_percentage",
    "production_cost",
    "is_prod_forced",
    "taxes",
    "four_week_rate_card",
    "internal_four_week_media_cost",
    "additional_installation_cost",
    "initial_installation_cost",
    "unit_highlights",
    "latitude",
    "longitude",
    "no_of_spots_per_loop",
    "spot_length_secs",
    "raw_installation_cost",
    "raw_date",
    "no_of_periods",
    "image_id",
    "cost_basis",
];

const KEY_COLUMNS: &[&str] = &["id", "unit_id", "project_id", "vendor_id"];
const STATE_COLUMNS: &[&str] = &["user_locked", "selected", "created_at", "updated_at"];

/// Full column list of a submission row, qualified by `alias`.
fn columns(alias: &str) -> String {
    KEY_COLUMNS
        .iter()
        .chain(FIELD_COLUMNS)
        .chain(STATE_COLUMNS)
        .map(|c| format!("{alias}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Entity for Submission {
    const TABLE: &'static str = "submissions";
    const COLUMNS: &'static str = "*";
}

/// Wrap a data-modifying statement named `s` so it returns rows joined with
/// the vendor name.
fn with_vendor_name(statement: &str) -> String {
    format!(
        "WITH s AS ({statement} RETURNING *)
         SELECT {}, v.name AS vendor_name
         FROM s JOIN vendors v ON v.id = s.vendor_id",
        columns("s")
    )
}

/// `INSERT` of a new submission. `$1` unit id, `$2` project, `$3` vendor,
/// attributes from `$4`. Conflicting unit ids insert nothing.
fn insert_sql() -> String {
    let first = KEY_COLUMNS.len();
    let values = FIELD_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let n = first + i;
            match *column {
                "is_illuminated" => format!("COALESCE(${n}, false)"),
                "cost_basis" => format!("COALESCE(${n}, 'four_week_media_cost')"),
                _ => format!("${n}"),
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    with_vendor_name(&format!(
        "INSERT INTO submissions (unit_id, project_id, vendor_id, {})
         VALUES ($1, $2, $3, {values})
         ON CONFLICT (unit_id) DO NOTHING",
        FIELD_COLUMNS.join(", ")
    ))
}

/// Attribute columns that are `NOT NULL`; an explicit null leaves them as is.
const REQUIRED_COLUMNS: &[&str] = &["is_illuminated", "cost_basis"];

/// Partial `UPDATE`. Attribute parameters start at `$first`; the parameter
/// after them holds the names of attributes sent as explicit nulls.
///
/// An attribute is written when its parameter is non-NULL or its name is in
/// that list, and otherwise keeps its stored value.
fn update_sql(filter: &str, first: usize, lock: bool) -> String {
    let cleared = first + FIELD_COLUMNS.len();
    let mut assignments: Vec<String> = FIELD_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let n = first + i;
            if REQUIRED_COLUMNS.contains(column) {
                format!("{column} = COALESCE(${n}, {column})")
            } else {
                format!(
                    "{column} = CASE WHEN ${n} IS NOT NULL OR '{column}' = ANY(${cleared}) \
                     THEN ${n} ELSE {column} END"
                )
            }
        })
        .collect();
    if lock {
        assignments.push("user_locked = true".to_string());
    }
    with_vendor_name(&format!(
        "UPDATE submissions SET {} WHERE {filter}",
        assignments.join(", ")
    ))
}

/// Bind the attributes of `fields` followed by the cleared-attribute names,
/// matching [`update_sql`].
fn bind_changes<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    fields: &'q SubmissionFields,
    cleared: &'q ClearedFields,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    bind_fields(query, fields).bind(cleared.names())
}

/// Bind every attribute of `fields` in [`FIELD_COLUMNS`] order.
fn bind_fields<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    fields: &'q SubmissionFields,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    query
        .bind(&fields.unit)
        .bind(&fields.town)
        .bind(&fields.state)
        .bind(&fields.market)
        .bind(&fields.location_description)
        .bind(&fields.geopath_id)
        .bind(&fields.target_location)
        .bind(&fields.distance_to_location)
        .bind(fields.a18_weekly_impressions)
        .bind(fields.a18_4wk_reach)
        .bind(fields.a18_4wk_freq)
        .bind(&fields.size)
        .bind(&fields.media_type)
        .bind(&fields.facing)
        .bind(fields.is_illuminated)
        .bind(fields.availability_start)
        .bind(fields.availability_end)
        .bind(fields.total_units)
        .bind(fields.one_week_media_cost)
        .bind(fields.two_week_media_cost)
        .bind(fields.three_week_media_cost)
        .bind(fields.four_week_media_cost)
        .bind(fields.installation_cost)
        .bind(fields.markup_percentage)
        .bind(fields.production_cost)
        .bind(fields.is_prod_forced)
        .bind(fields.taxes)
        .bind(fields.four_week_rate_card)
        .bind(fields.internal_four_week_media_cost)
        .bind(fields.additional_installation_cost)
        .bind(fields.initial_installation_cost)
        .bind(&fields.unit_highlights)
        .bind(fields.latitude)
        .bind(fields.longitude)
        .bind(fields.no_of_spots_per_loop)
        .bind(fields.spot_length_secs)
        .bind(&fields.raw_installation_cost)
        .bind(&fields.raw_date)
        .bind(fields.no_of_periods)
        .bind(&fields.image_id)
        .bind(fields.cost_basis.map(|b| b.as_str()))
}

/// `WHERE` body of the listing and its count.
///
/// `$1` project, `$2`..`$7` exact filters, `$8` contains pattern, `$9`
/// prefix pattern for `facing`.
const LIST_FILTER: &str = "s.project_id = $1
       AND ($2::TEXT IS NULL OR s.state = $2)
       AND ($3::TEXT IS NULL OR s.town = $3)
       AND ($4::TEXT IS NULL OR s.media_type = $4)
       AND ($5::TEXT IS NULL OR v.name = $5)
       AND ($6::BOOLEAN IS NULL OR s.is_illuminated = $6)
       AND ($7::BOOLEAN IS NULL OR s.selected = $7)
       AND ($8::TEXT IS NULL
            OR v.name ILIKE $8
            OR s.unit_id ILIKE $8
            OR s.town ILIKE $8
            OR s.market ILIKE $8
            OR s.state ILIKE $8
            OR s.media_type ILIKE $8
            OR s.facing ILIKE $9)";

/// Result of [`SubmissionRepo::upsert`].
#[derive(Debug)]
pub enum UpsertOutcome {
    Created(SubmissionWithVendor),
    Updated(SubmissionWithVendor),
    /// The submission is user-locked and the caller may not overwrite it.
    /// Nothing was written.
    Locked,
}

/// Columns whose distinct values feed the per-project autocomplete lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupColumn {
    MediaType,
    Town,
    State,
}

impl LookupColumn {
    fn column(self) -> &'static str {
        match self {
            LookupColumn::MediaType => "media_type",
            LookupColumn::Town => "town",
            LookupColumn::State => "state",
        }
    }
}

/// Provides CRUD and selection operations for submissions.
pub struct SubmissionRepo;

impl SubmissionRepo {
    /// Find a submission of a project by its unit id.
    pub async fn find_in_project(
        pool: &PgPool,
        project_id: DbId,
        unit_id: &str,
    ) -> Result<Option<SubmissionWithVendor>, sqlx::Error> {
        let query = format!(
            "SELECT {}, v.name AS vendor_name
             FROM submissions s JOIN vendors v ON v.id = s.vendor_id
             WHERE s.project_id = $1 AND s.unit_id = $2",
            columns("s")
        );
        sqlx::query_as::<_, SubmissionWithVendor>(&query)
            .bind(project_id)
            .bind(unit_id)
            .fetch_optional(pool)
            .await
    }

    /// Create the submission, or update the existing row with this unit id.
    ///
    /// Creating first ensures the vendor and its project link exist. An
    /// existing row keeps its project and vendor; only attributes present in
    /// `input` change. When the row is user-locked and `overwrite_locked` is
    /// false the transaction is rolled back and [`UpsertOutcome::Locked`]
    /// returned.
    pub async fn upsert(
        pool: &PgPool,
        project_id: DbId,
        input: &CreateSubmission,
        overwrite_locked: bool,
    ) -> Result<UpsertOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if let Some(existing) = Self::lock_by_unit_id(&mut tx, &input.unit_id).await? {
            return Self::update_existing(tx, existing, input, overwrite_locked).await;
        }

        let emails: Vec<String> = input.vendor_email.iter().cloned().collect();
        let vendor = VendorRepo::find_or_create(&mut *tx, &input.vendor, &emails).await?;
        ProjectVendorRepo::link(&mut *tx, project_id, vendor.id).await?;

        let query = insert_sql();
        let inserted = bind_fields(
            sqlx::query_as::<_, SubmissionWithVendor>(&query)
                .bind(&input.unit_id)
                .bind(project_id)
                .bind(vendor.id),
            &input.fields,
        )
        .fetch_optional(&mut *tx)
        .await?;

        match inserted {
            Some(created) => {
                tx.commit().await?;
                Ok(UpsertOutcome::Created(created))
            }
            None => {
                // A concurrent request inserted this unit id after our first
                // lookup; its row is committed and visible now.
                let existing = Self::lock_by_unit_id(&mut tx, &input.unit_id)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                Self::update_existing(tx, existing, input, overwrite_locked).await
            }
        }
    }

    /// Apply the attributes present in `input` (explicit nulls clear the
    /// column) and lock the row against automated overwrites.
    ///
    /// Returns `None` if the project has no submission with this unit id.
    pub async fn patch(
        pool: &PgPool,
        project_id: DbId,
        unit_id: &str,
        input: &UpdateSubmission,
    ) -> Result<Option<SubmissionWithVendor>, sqlx::Error> {
        let query = update_sql("project_id = $1 AND unit_id = $2", 3, true);
        bind_changes(
            sqlx::query_as::<_, SubmissionWithVendor>(&query)
                .bind(project_id)
                .bind(unit_id),
            &input.fields,
            &input.cleared,
        )
        .fetch_optional(pool)
        .await
    }

    /// One page of a project's submissions plus the total number of matches.
    pub async fn list(
        pool: &PgPool,
        project_id: DbId,
        filter: &SubmissionFilter,
    ) -> Result<(Vec<SubmissionWithVendor>, i64), sqlx::Error> {
        let term = normalize_term(filter.search.as_deref());
        let contains = term.map(contains_pattern);
        let prefix = term.map(prefix_pattern);

        let count_query = format!(
            "SELECT COUNT(*) FROM submissions s JOIN vendors v ON v.id = s.vendor_id
             WHERE {LIST_FILTER}"
        );
        let total = sqlx::query_scalar::<_, i64>(&count_query)
            .bind(project_id)
            .bind(&filter.state)
            .bind(&filter.town)
            .bind(&filter.media_type)
            .bind(&filter.vendor)
            .bind(filter.illuminated)
            .bind(filter.selected)
            .bind(&contains)
            .bind(&prefix)
            .fetch_one(pool)
            .await?;

        let order_by = filter
            .sort
            .map(|sort| sort.order_by())
            .unwrap_or_else(|| "s.id ASC".to_string());
        let page_query = format!(
            "SELECT {}, v.name AS vendor_name
             FROM submissions s JOIN vendors v ON v.id = s.vendor_id
             WHERE {LIST_FILTER}
             ORDER BY {order_by}
             LIMIT $10 OFFSET $11",
            columns("s")
        );
        let rows = sqlx::query_as::<_, SubmissionWithVendor>(&page_query)
            .bind(project_id)
            .bind(&filter.state)
            .bind(&filter.town)
            .bind(&filter.media_type)
            .bind(&filter.vendor)
            .bind(filter.illuminated)
            .bind(filter.selected)
            .bind(&contains)
            .bind(&prefix)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    /// Set `selected` on the listed units of a project and return the
    /// resulting statistics.
    ///
    /// The project row is locked for the duration, so concurrent selection
    /// changes on the same project serialize and the returned statistics
    /// reflect exactly this update. Unit ids not in the project are ignored.
    pub async fn set_selection(
        pool: &PgPool,
        project_id: DbId,
        unit_ids: &[String],
        selected: bool,
    ) -> Result<SelectionStats, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "UPDATE submissions SET selected = $3
             WHERE project_id = $1 AND unit_id = ANY($2)",
        )
        .bind(project_id)
        .bind(unit_ids)
        .bind(selected)
        .execute(&mut *tx)
        .await?;
        tracing::debug!(
            project_id,
            matched = result.rows_affected(),
            requested = unit_ids.len(),
            selected,
            "Applied submission selection"
        );

        let stats = Self::stats_with(&mut *tx, project_id).await?;
        tx.commit().await?;
        Ok(stats)
    }

    /// Statistics over the project's currently selected submissions.
    pub async fn selection_stats(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<SelectionStats, sqlx::Error> {
        Self::stats_with(pool, project_id).await
    }

    /// Distinct non-null values of one column within a project, for
    /// autocomplete. The filter's state/town/media type narrow the rows.
    pub async fn distinct_values(
        pool: &PgPool,
        project_id: DbId,
        column: LookupColumn,
        filter: &LookupFilter,
    ) -> Result<Vec<String>, sqlx::Error> {
        let column = column.column();
        let pattern = normalize_term(filter.search.as_deref()).map(contains_pattern);
        let query = format!(
            "SELECT DISTINCT {column} FROM submissions
             WHERE project_id = $1
               AND {column} IS NOT NULL
               AND ($2::TEXT IS NULL OR {column} ILIKE $2)
               AND ($3::TEXT IS NULL OR state = $3)
               AND ($4::TEXT IS NULL OR town = $4)
               AND ($5::TEXT IS NULL OR media_type = $5)
             ORDER BY {column}
             LIMIT $6"
        );
        sqlx::query_scalar::<_, String>(&query)
            .bind(project_id)
            .bind(pattern)
            .bind(&filter.state)
            .bind(&filter.town)
            .bind(&filter.media_type)
            .bind(LOOKUP_LIMIT)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn stats_with<'e>(
        executor: impl PgExecutor<'e>,
        project_id: DbId,
    ) -> Result<SelectionStats, sqlx::Error> {
        let rows = sqlx::query_as::<_, SelectedCostRow>(
            "SELECT a18_weekly_impressions, no_of_periods,
                    one_week_media_cost, two_week_media_cost,
                    three_week_media_cost, four_week_media_cost, cost_basis
             FROM submissions
             WHERE project_id = $1 AND selected",
        )
        .bind(project_id)
        .fetch_all(executor)
        .await?;
        Ok(SelectionStats::from_units(rows.into_iter().map(SelectedUnit::from)))
    }

    async fn lock_by_unit_id(
        tx: &mut Transaction<'_, Postgres>,
        unit_id: &str,
    ) -> Result<Option<Submission>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM submissions s WHERE s.unit_id = $1 FOR UPDATE",
            columns("s")
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(unit_id)
            .fetch_optional(&mut **tx)
            .await
    }

    async fn update_existing(
        mut tx: Transaction<'_, Postgres>,
        existing: Submission,
        input: &CreateSubmission,
        overwrite_locked: bool,
    ) -> Result<UpsertOutcome, sqlx::Error> {
        if existing.user_locked && !overwrite_locked {
            tx.rollback().await?;
            return Ok(UpsertOutcome::Locked);
        }

        let query = update_sql("id = $1", 2, false);
        let updated = bind_changes(
            sqlx::query_as::<_, SubmissionWithVendor>(&query).bind(existing.id),
            &input.fields,
            &input.cleared,
        )
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(UpsertOutcome::Updated(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_places_attributes_after_keys() {
        let sql = insert_sql();
        assert!(sql.contains("VALUES ($1, $2, $3, $4, $5"));
        assert!(sql.contains("COALESCE($18, false)"));
        assert!(sql.contains(&format!(
            "COALESCE(${}, 'four_week_media_cost')",
            3 + FIELD_COLUMNS.len()
        )));
    }

    #[test]
    fn update_writes_present_or_cleared_attributes() {
        let sql = update_sql("id = $1", 2, false);
        let cleared = 2 + FIELD_COLUMNS.len();
        assert!(sql.contains(&format!(
            "unit = CASE WHEN $2 IS NOT NULL OR 'unit' = ANY(${cleared})"
        )));
        let basis = 1 + FIELD_COLUMNS.len();
        assert!(sql.contains(&format!("cost_basis = COALESCE(${basis}, cost_basis)")));
        assert!(sql.contains("is_illuminated = COALESCE($16, is_illuminated)"));
        assert!(!sql.contains("user_locked = true"));
    }

    #[test]
    fn patch_update_locks_row() {
        let sql = update_sql("project_id = $1 AND unit_id = $2", 3, true);
        assert!(sql.contains("user_locked = true"));
        assert!(sql.contains("unit = CASE WHEN $3 IS NOT NULL"));
    }

    #[test]
    fn qualified_columns_cover_whole_row() {
        let list = columns("s");
        assert!(list.starts_with("s.id, s.unit_id"));
        assert!(list.ends_with("s.updated_at"));
        assert_eq!(
            list.split(", ").count(),
            KEY_COLUMNS.len() + FIELD_COLUMNS.len() + STATE_COLUMNS.len()
        );
    }
}
