//! Project lifecycle status.
//!
//! Two spellings exist for every status: the snake_case name stored in the
//! `projects.status` column and the human label used on the wire
//! (`"Vendor Request Sent"`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "Active")]
    Active,
    #[serde(rename = "Delivered")]
    Delivered,
    #[serde(rename = "Vendor Request Sent")]
    VendorRequestSent,
    #[serde(rename = "Closed")]
    Closed,
    #[serde(rename = "Sold")]
    Sold,
    #[serde(rename = "Lost")]
    Lost,
    #[serde(rename = "Not Started")]
    NotStarted,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 7] = [
        ProjectStatus::Active,
        ProjectStatus::Delivered,
        ProjectStatus::VendorRequestSent,
        ProjectStatus::Closed,
        ProjectStatus::Sold,
        ProjectStatus::Lost,
        ProjectStatus::NotStarted,
    ];

    /// Column value.
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Delivered => "delivered",
            ProjectStatus::VendorRequestSent => "vendor_request_sent",
            ProjectStatus::Closed => "closed",
            ProjectStatus::Sold => "sold",
            ProjectStatus::Lost => "lost",
            ProjectStatus::NotStarted => "not_started",
        }
    }

    /// Wire label.
    pub fn label(self) -> &'static str {
        match self {
            ProjectStatus::Active => "Active",
            ProjectStatus::Delivered => "Delivered",
            ProjectStatus::VendorRequestSent => "Vendor Request Sent",
            ProjectStatus::Closed => "Closed",
            ProjectStatus::Sold => "Sold",
            ProjectStatus::Lost => "Lost",
            ProjectStatus::NotStarted => "Not Started",
        }
    }

    /// Parse a comma-separated list of wire labels (`"Active,Closed"`).
    ///
    /// Blank entries are skipped, so `None`, `""` and `" , "` all yield an
    /// empty list, which callers treat as "no status filter".
    pub fn parse_list(raw: Option<&str>) -> Result<Vec<ProjectStatus>, CoreError> {
        let Some(raw) = raw else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProjectStatus {
    type Err = CoreError;

    /// Accepts either the wire label or the column name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectStatus::ALL
            .into_iter()
            .find(|status| status.label() == s || status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown project status '{s}'")))
    }
}

impl TryFrom<String> for ProjectStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
