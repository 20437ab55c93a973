//! Domain rules for the media planning backend.
//!
//! Everything in this crate is pure: no database, no HTTP. The `db` and `api`
//! crates build on these types and functions.

pub mod api_keys;
pub mod cost;
pub mod error;
pub mod identity;
pub mod project_status;
pub mod search;
pub mod selection;
pub mod sorting;
pub mod types;
