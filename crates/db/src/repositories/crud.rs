//! By-id operations shared by every table.
//!
//! Repositories implement [`Entity`] for their row type; [`Crud`] then
//! provides lookup, counting and deletion without per-table boilerplate.

use mediadesk_core::types::DbId;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};

/// A table whose rows map onto `Self`.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
    /// Column list selected into `Self`.
    const COLUMNS: &'static str;
}

/// Generic by-id access over any [`Entity`].
pub struct Crud;

impl Crud {
    /// Find a row by its internal ID.
    pub async fn find_by_id<T: Entity>(pool: &PgPool, id: DbId) -> Result<Option<T>, sqlx::Error> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", T::COLUMNS, T::TABLE);
        sqlx::query_as::<_, T>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Count every row of the table.
    pub async fn count<T: Entity>(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        sqlx::query_scalar::<_, i64>(&query).fetch_one(pool).await
    }

    /// Permanently delete a row by ID. Returns `true` if a row was removed.
    pub async fn delete<T: Entity>(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let query = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
