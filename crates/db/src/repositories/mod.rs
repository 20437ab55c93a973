//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` (or an open transaction) as the first argument.

pub mod crud;
pub mod link_repo;
pub mod project_repo;
pub mod submission_repo;
pub mod user_repo;
pub mod vendor_repo;

pub use crud::{Crud, Entity};
pub use link_repo::{ProjectVendorRepo, UserProjectRepo};
pub use project_repo::ProjectRepo;
pub use submission_repo::{LookupColumn, SubmissionRepo, UpsertOutcome};
pub use user_repo::UserRepo;
pub use vendor_repo::VendorRepo;
