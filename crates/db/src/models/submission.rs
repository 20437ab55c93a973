//! Submission entity model and DTOs.
//!
//! A submission is one piece of media inventory (a billboard face, a digital
//! screen) a vendor offers into a project, identified by a globally unique
//! `unit_id`.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use mediadesk_core::cost::{self, CostBasis, MediaPrices};
use mediadesk_core::selection::SelectedUnit;
use mediadesk_core::sorting::SubmissionSort;
use mediadesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use validator::Validate;

use super::{reject_unknown_fields, UnknownFields};

/// A submission row from the `submissions` table.
#[derive(Debug, Clone, FromRow)]
pub struct Submission {
    pub id: DbId,
    pub unit_id: String,
    pub project_id: DbId,
    pub vendor_id: DbId,
    pub unit: Option<String>,
    pub town: Option<String>,
    pub state: Option<String>,
    pub market: Option<String>,
    pub location_description: Option<String>,
    pub geopath_id: Option<String>,
    pub target_location: Option<String>,
    pub distance_to_location: Option<String>,
    pub a18_weekly_impressions: Option<i32>,
    pub a18_4wk_reach: Option<f64>,
    pub a18_4wk_freq: Option<f64>,
    pub size: Option<String>,
    pub media_type: Option<String>,
    pub facing: Option<String>,
    pub is_illuminated: bool,
    pub availability_start: Option<NaiveDate>,
    pub availability_end: Option<NaiveDate>,
    pub total_units: Option<i32>,
    pub one_week_media_cost: Option<f64>,
    pub two_week_media_cost: Option<f64>,
    pub three_week_media_cost: Option<f64>,
    pub four_week_media_cost: Option<f64>,
    pub installation_cost: Option<f64>,
    pub markup_percentage: Option<f64>,
    pub production_cost: Option<f64>,
    pub is_prod_forced: Option<bool>,
    pub taxes: Option<f64>,
    pub four_week_rate_card: Option<f64>,
    pub internal_four_week_media_cost: Option<f64>,
    pub additional_installation_cost: Option<f64>,
    pub initial_installation_cost: Option<f64>,
    pub unit_highlights: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub no_of_spots_per_loop: Option<f64>,
    pub spot_length_secs: Option<f64>,
    pub raw_installation_cost: Option<String>,
    pub raw_date: Option<String>,
    pub no_of_periods: Option<i32>,
    pub image_id: Option<String>,
    #[sqlx(try_from = "String")]
    pub cost_basis: CostBasis,
    pub user_locked: bool,
    pub selected: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Submission {
    pub fn prices(&self) -> MediaPrices {
        MediaPrices {
            one_week: self.one_week_media_cost,
            two_week: self.two_week_media_cost,
            three_week: self.three_week_media_cost,
            four_week: self.four_week_media_cost,
        }
    }

    pub fn total_media_cost(&self) -> Option<f64> {
        cost::total_media_cost(&self.prices(), self.cost_basis, self.no_of_periods)
    }

    pub fn total_cost(&self) -> Option<f64> {
        cost::total_cost(
            self.total_media_cost(),
            self.production_cost,
            self.markup_percentage,
        )
    }

    /// The client-editable attributes of this row.
    pub fn fields(&self) -> SubmissionFields {
        SubmissionFields {
            unit: self.unit.clone(),
            town: self.town.clone(),
            state: self.state.clone(),
            market: self.market.clone(),
            location_description: self.location_description.clone(),
            geopath_id: self.geopath_id.clone(),
            target_location: self.target_location.clone(),
            distance_to_location: self.distance_to_location.clone(),
            a18_weekly_impressions: self.a18_weekly_impressions,
            a18_4wk_reach: self.a18_4wk_reach,
            a18_4wk_freq: self.a18_4wk_freq,
            size: self.size.clone(),
            media_type: self.media_type.clone(),
            facing: self.facing.clone(),
            is_illuminated: Some(self.is_illuminated),
            availability_start: self.availability_start,
            availability_end: self.availability_end,
            total_units: self.total_units,
            one_week_media_cost: self.one_week_media_cost,
            two_week_media_cost: self.two_week_media_cost,
            three_week_media_cost: self.three_week_media_cost,
            four_week_media_cost: self.four_week_media_cost,
            installation_cost: self.installation_cost,
            markup_percentage: self.markup_percentage,
            production_cost: self.production_cost,
            is_prod_forced: self.is_prod_forced,
            taxes: self.taxes,
            four_week_rate_card: self.four_week_rate_card,
            internal_four_week_media_cost: self.internal_four_week_media_cost,
            additional_installation_cost: self.additional_installation_cost,
            initial_installation_cost: self.initial_installation_cost,
            unit_highlights: self.unit_highlights.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            no_of_spots_per_loop: self.no_of_spots_per_loop,
            spot_length_secs: self.spot_length_secs,
            raw_installation_cost: self.raw_installation_cost.clone(),
            raw_date: self.raw_date.clone(),
            no_of_periods: self.no_of_periods,
            image_id: self.image_id.clone(),
            cost_basis: Some(self.cost_basis),
        }
    }
}

/// A submission together with its vendor's name.
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionWithVendor {
    #[sqlx(flatten)]
    pub submission: Submission,
    pub vendor_name: String,
}

/// Client-editable submission attributes.
///
/// Shared by the create and partial-update payloads and echoed back in
/// responses. On update, a `None` leaves the stored column untouched unless
/// the payload sent that key as an explicit `null` (see [`ClearedFields`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionFields {
    pub unit: Option<String>,
    pub town: Option<String>,
    pub state: Option<String>,
    pub market: Option<String>,
    pub location_description: Option<String>,
    pub geopath_id: Option<String>,
    pub target_location: Option<String>,
    pub distance_to_location: Option<String>,
    pub a18_weekly_impressions: Option<i32>,
    pub a18_4wk_reach: Option<f64>,
    pub a18_4wk_freq: Option<f64>,
    pub size: Option<String>,
    pub media_type: Option<String>,
    pub facing: Option<String>,
    pub is_illuminated: Option<bool>,
    pub availability_start: Option<NaiveDate>,
    pub availability_end: Option<NaiveDate>,
    pub total_units: Option<i32>,
    pub one_week_media_cost: Option<f64>,
    pub two_week_media_cost: Option<f64>,
    pub three_week_media_cost: Option<f64>,
    pub four_week_media_cost: Option<f64>,
    pub installation_cost: Option<f64>,
    pub markup_percentage: Option<f64>,
    pub production_cost: Option<f64>,
    pub is_prod_forced: Option<bool>,
    pub taxes: Option<f64>,
    pub four_week_rate_card: Option<f64>,
    pub internal_four_week_media_cost: Option<f64>,
    pub additional_installation_cost: Option<f64>,
    pub initial_installation_cost: Option<f64>,
    pub unit_highlights: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub no_of_spots_per_loop: Option<f64>,
    pub spot_length_secs: Option<f64>,
    pub raw_installation_cost: Option<String>,
    pub raw_date: Option<String>,
    pub no_of_periods: Option<i32>,
    pub image_id: Option<String>,
    pub cost_basis: Option<CostBasis>,
}

/// Keys a payload sent as an explicit JSON `null`.
///
/// Serde folds `null` and an absent key into the same `None`; this keeps the
/// difference so an update can clear a column instead of skipping it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearedFields(BTreeSet<String>);

impl ClearedFields {
    fn from_body(body: &Map<String, Value>) -> Self {
        Self(
            body.iter()
                .filter(|(_, value)| value.is_null())
                .map(|(key, _)| key.clone())
                .collect(),
        )
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(String::as_str).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ClearedFields {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Request body for `POST /projects/{wilkins_id}/submissions`.
///
/// `vendor` names the offering vendor; it is created (with `vendor_email` as
/// its only contact) when the name is new.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(try_from = "Map<String, Value>")]
pub struct CreateSubmission {
    #[validate(length(min = 1, max = 256))]
    pub unit_id: String,
    #[validate(length(min = 1, max = 64))]
    pub vendor: String,
    #[validate(email)]
    pub vendor_email: Option<String>,
    pub fields: SubmissionFields,
    pub cleared: ClearedFields,
    #[validate(custom(function = "reject_unknown_fields"))]
    pub unknown: UnknownFields,
}

#[derive(Deserialize)]
struct CreateSubmissionBody {
    unit_id: String,
    vendor: String,
    vendor_email: Option<String>,
    #[serde(flatten)]
    fields: SubmissionFields,
    #[serde(flatten)]
    unknown: UnknownFields,
}

impl TryFrom<Map<String, Value>> for CreateSubmission {
    type Error = serde_json::Error;

    fn try_from(body: Map<String, Value>) -> Result<Self, Self::Error> {
        let cleared = ClearedFields::from_body(&body);
        let body: CreateSubmissionBody = serde_json::from_value(Value::Object(body))?;
        Ok(Self {
            unit_id: body.unit_id,
            vendor: body.vendor,
            vendor_email: body.vendor_email,
            fields: body.fields,
            cleared,
            unknown: body.unknown,
        })
    }
}

/// Request body for `PATCH /projects/{wilkins_id}/submissions/{unit_id}`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(try_from = "Map<String, Value>")]
pub struct UpdateSubmission {
    pub fields: SubmissionFields,
    pub cleared: ClearedFields,
    #[validate(custom(function = "reject_unknown_fields"))]
    pub unknown: UnknownFields,
}

#[derive(Deserialize)]
struct UpdateSubmissionBody {
    #[serde(flatten)]
    fields: SubmissionFields,
    #[serde(flatten)]
    unknown: UnknownFields,
}

impl TryFrom<Map<String, Value>> for UpdateSubmission {
    type Error = serde_json::Error;

    fn try_from(body: Map<String, Value>) -> Result<Self, Self::Error> {
        let cleared = ClearedFields::from_body(&body);
        let body: UpdateSubmissionBody = serde_json::from_value(Value::Object(body))?;
        Ok(Self {
            fields: body.fields,
            cleared,
            unknown: body.unknown,
        })
    }
}

/// Vendor reference embedded in [`SubmissionOut`].
#[derive(Debug, Clone, Serialize)]
pub struct VendorName {
    pub name: String,
}

/// Response for submission create / update.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOut {
    pub unit_id: String,
    pub vendor: VendorName,
    pub selected: bool,
    pub user_locked: bool,
    #[serde(flatten)]
    pub fields: SubmissionFields,
}

impl From<SubmissionWithVendor> for SubmissionOut {
    fn from(row: SubmissionWithVendor) -> Self {
        Self {
            fields: row.submission.fields(),
            unit_id: row.submission.unit_id,
            vendor: VendorName {
                name: row.vendor_name,
            },
            selected: row.submission.selected,
            user_locked: row.submission.user_locked,
        }
    }
}

/// One row of the submission listing.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionListItem {
    pub unit_id: String,
    pub vendor: String,
    pub selected: bool,
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub fields: SubmissionFields,
}

impl SubmissionListItem {
    pub fn new(row: SubmissionWithVendor, image_url: Option<String>) -> Self {
        Self {
            fields: row.submission.fields(),
            unit_id: row.submission.unit_id,
            vendor: row.vendor_name,
            selected: row.submission.selected,
            image_url,
        }
    }
}

/// Filters for the submission listing of one project.
///
/// Exact-match filters combine with AND; `search` matches any of vendor name,
/// unit id, town, market, state, media type (substring) or facing (prefix).
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub state: Option<String>,
    pub town: Option<String>,
    pub media_type: Option<String>,
    pub vendor: Option<String>,
    pub illuminated: Option<bool>,
    pub selected: Option<bool>,
    pub search: Option<String>,
    pub sort: Option<SubmissionSort>,
    pub limit: i64,
    pub offset: i64,
}

/// Optional narrowing for the per-project autocomplete lookups.
#[derive(Debug, Clone, Default)]
pub struct LookupFilter {
    pub search: Option<String>,
    pub state: Option<String>,
    pub town: Option<String>,
    pub media_type: Option<String>,
}

/// Request body for `PUT /projects/{wilkins_id}/select-submissions`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SelectSubmissions {
    pub unit_ids: Vec<String>,
    pub selected: bool,
}

/// The columns of a selected submission that feed the aggregate statistics.
#[derive(Debug, Clone, FromRow)]
pub struct SelectedCostRow {
    pub a18_weekly_impressions: Option<i32>,
    pub no_of_periods: Option<i32>,
    pub one_week_media_cost: Option<f64>,
    pub two_week_media_cost: Option<f64>,
    pub three_week_media_cost: Option<f64>,
    pub four_week_media_cost: Option<f64>,
    #[sqlx(try_from = "String")]
    pub cost_basis: CostBasis,
}

impl From<SelectedCostRow> for SelectedUnit {
    fn from(row: SelectedCostRow) -> Self {
        let prices = MediaPrices {
            one_week: row.one_week_media_cost,
            two_week: row.two_week_media_cost,
            three_week: row.three_week_media_cost,
            four_week: row.four_week_media_cost,
        };
        SelectedUnit {
            weekly_impressions: row.a18_weekly_impressions.map(i64::from),
            total_media_cost: cost::total_media_cost(&prices, row.cost_basis, row.no_of_periods),
        }
    }
}
