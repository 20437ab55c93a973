//! User entity model and DTOs.

use mediadesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Plaintext user summary returned on sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub user_id: DbId,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Insert DTO. The password is already hashed.
#[derive(Debug)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Request body for provisioning a user onto a project.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProvisionUser {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
    pub is_admin: Option<bool>,
}

/// Response for a provisioned user.
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<User> for UserOut {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}
