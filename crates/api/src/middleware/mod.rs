//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Resolves the caller from a Bearer token (local or
//!   federated).
//! - [`access::RequireService`] -- Requires the automation identity.

pub mod access;
pub mod auth;
