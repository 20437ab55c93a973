//! Vendor entity model and DTOs.

use mediadesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidateEmail, ValidationError};

/// A vendor row from the `vendors` table. Names are unique.
#[derive(Debug, Clone, FromRow)]
pub struct Vendor {
    pub id: DbId,
    pub name: String,
    pub emails: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for `POST /projects/{wilkins_id}/vendors`.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegisterVendor {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_email_list"))]
    pub emails: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct VendorOut {
    pub name: String,
    pub emails: Vec<String>,
}

impl From<Vendor> for VendorOut {
    fn from(vendor: Vendor) -> Self {
        Self {
            name: vendor.name,
            emails: vendor.emails,
        }
    }
}

#[allow(clippy::ptr_arg)]
fn validate_email_list(emails: &Vec<String>) -> Result<(), ValidationError> {
    match emails.iter().find(|e| !e.validate_email()) {
        Some(bad) => Err(ValidationError::new("email")
            .with_message(format!("'{bad}' is not a valid e-mail address").into())),
        None => Ok(()),
    }
}
