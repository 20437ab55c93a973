//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - `Deserialize` request DTOs (validated before any query runs)
//! - `Serialize` response shapes where the row itself must not leak

pub mod link;
pub mod project;
pub mod submission;
pub mod user;
pub mod vendor;

use std::collections::BTreeMap;

use validator::ValidationError;

/// Keys a request body carried that no field claimed.
///
/// Payloads that use `#[serde(flatten)]` cannot also use
/// `deny_unknown_fields`; they collect leftovers here and reject them during
/// validation instead.
pub type UnknownFields = BTreeMap<String, serde_json::Value>;

pub(crate) fn reject_unknown_fields(unknown: &UnknownFields) -> Result<(), ValidationError> {
    if unknown.is_empty() {
        return Ok(());
    }
    let names: Vec<&str> = unknown.keys().map(String::as_str).collect();
    Err(ValidationError::new("unknown_field")
        .with_message(format!("Unknown field(s): {}", names.join(", ")).into()))
}
