//! Query parameter types for listing and lookup endpoints.
//!
//! Each struct mirrors the query string as sent and converts into the filter
//! the repository layer expects, clamping pagination on the way.

use mediadesk_core::error::CoreError;
use mediadesk_core::project_status::ProjectStatus;
use mediadesk_core::search::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use mediadesk_core::sorting::SubmissionSort;
use mediadesk_db::models::project::ProjectFilter;
use mediadesk_db::models::submission::{LookupFilter, SubmissionFilter};
use serde::Deserialize;

/// `GET /projects?status=&vendor=&client=&search=&limit=&skip=`
///
/// `status` may repeat (`status=Active&status=Closed`, also spelled
/// `status[]=`), and each value may itself be a comma-separated list.
/// Deserialized from the raw pairs because a derived struct rejects a
/// repeated key.
#[derive(Debug, Default, Deserialize)]
#[serde(try_from = "Vec<(String, String)>")]
pub struct ProjectListParams {
    pub status: Vec<String>,
    pub vendor: Option<String>,
    pub client: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

impl TryFrom<Vec<(String, String)>> for ProjectListParams {
    type Error = String;

    fn try_from(pairs: Vec<(String, String)>) -> Result<Self, Self::Error> {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "status" | "status[]" => params.status.push(value),
                "vendor" => params.vendor = Some(value),
                "client" => params.client = Some(value),
                "search" => params.search = Some(value),
                "limit" => params.limit = Some(parse_integer(&key, &value)?),
                "skip" => params.skip = Some(parse_integer(&key, &value)?),
                _ => {}
            }
        }
        Ok(params)
    }
}

fn parse_integer(key: &str, value: &str) -> Result<i64, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{key}: expected an integer, got '{value}'"))
}

impl ProjectListParams {
    pub fn into_filter(self) -> Result<ProjectFilter, CoreError> {
        let mut statuses = Vec::new();
        for raw in &self.status {
            for status in ProjectStatus::parse_list(Some(raw))? {
                if !statuses.contains(&status) {
                    statuses.push(status);
                }
            }
        }
        Ok(ProjectFilter {
            statuses,
            client: self.client,
            vendor: self.vendor,
            search: self.search,
            limit: clamp_limit(self.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
            offset: clamp_offset(self.skip),
        })
    }
}

/// `GET /projects/{wilkins_id}/submissions?...`
#[derive(Debug, Default, Deserialize)]
pub struct SubmissionListParams {
    pub state: Option<String>,
    pub town: Option<String>,
    pub media_type: Option<String>,
    pub vendor: Option<String>,
    pub illuminated: Option<bool>,
    pub selected: Option<bool>,
    pub search: Option<String>,
    pub sort_column: Option<String>,
    pub sort_order: Option<String>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

impl SubmissionListParams {
    /// Fails with a validation error when the sort column or direction is
    /// not one the listing knows.
    pub fn into_filter(self) -> Result<SubmissionFilter, CoreError> {
        let sort = SubmissionSort::parse(self.sort_column.as_deref(), self.sort_order.as_deref())?;
        Ok(SubmissionFilter {
            state: self.state,
            town: self.town,
            media_type: self.media_type,
            vendor: self.vendor,
            illuminated: self.illuminated,
            selected: self.selected,
            search: self.search,
            sort,
            limit: clamp_limit(self.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
            offset: clamp_offset(self.skip),
        })
    }
}

/// Autocomplete lookups: `?search=` plus optional location/media narrowing.
#[derive(Debug, Default, Deserialize)]
pub struct LookupParams {
    pub search: Option<String>,
    pub state: Option<String>,
    pub town: Option<String>,
    pub media_type: Option<String>,
}

impl From<LookupParams> for LookupFilter {
    fn from(params: LookupParams) -> Self {
        LookupFilter {
            search: params.search,
            state: params.state,
            town: params.town,
            media_type: params.media_type,
        }
    }
}
