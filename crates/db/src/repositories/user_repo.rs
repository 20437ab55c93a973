//! Repository for the `users` table.

use mediadesk_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::user::{CreateUser, User};
use crate::repositories::crud::{Crud, Entity};
use crate::repositories::link_repo::UserProjectRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, password_hash, is_admin, created_at, updated_at";

impl Entity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str = COLUMNS;
}

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, is_admin)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.is_admin)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        Crud::find_by_id::<User>(pool, id).await
    }

    /// Find a user by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Return the user with `input.email`, inserting it first if absent.
    ///
    /// An existing account is returned unchanged (its password and admin
    /// flag are not overwritten). Concurrent callers racing on the same
    /// e-mail both observe the single row that won.
    pub async fn find_or_create(
        conn: &mut PgConnection,
        input: &CreateUser,
    ) -> Result<User, sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (name, email, password_hash, is_admin)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(input.is_admin)
        .execute(&mut *conn)
        .await?;

        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .fetch_one(&mut *conn)
            .await
    }

    /// Ensure the user exists and has access to the project, in one
    /// transaction.
    pub async fn provision_for_project(
        pool: &PgPool,
        project_id: DbId,
        input: &CreateUser,
    ) -> Result<User, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let user = Self::find_or_create(&mut *tx, input).await?;
        UserProjectRepo::link(&mut *tx, user.id, project_id).await?;
        tx.commit().await?;
        Ok(user)
    }
}
