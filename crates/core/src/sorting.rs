//! Caller-selected ordering for submission listings.
//!
//! Clients name a field; only names in [`SORTABLE_FIELDS`] are accepted and
//! each maps to a fixed SQL column expression. Nothing the client sends is
//! ever spliced into a query.

use std::str::FromStr;

use crate::error::CoreError;

/// Sortable submission fields and the column each orders by.
///
/// Column expressions use the `s` (submissions) and `v` (vendors) aliases of
/// the listing query.
pub const SORTABLE_FIELDS: &[(&str, &str)] = &[
    ("unit_id", "s.unit_id"),
    ("unit", "s.unit"),
    ("vendor", "v.name"),
    ("town", "s.town"),
    ("market", "s.market"),
    ("state", "s.state"),
    ("location_description", "s.location_description"),
    ("geopath_id", "s.geopath_id"),
    ("target_location", "s.target_location"),
    ("distance_to_location", "s.distance_to_location"),
    ("a18_weekly_impressions", "s.a18_weekly_impressions"),
    ("a18_4wk_reach", "s.a18_4wk_reach"),
    ("a18_4wk_freq", "s.a18_4wk_freq"),
    ("size", "s.size"),
    ("media_type", "s.media_type"),
    ("facing", "s.facing"),
    ("is_illuminated", "s.is_illuminated"),
    ("availability_start", "s.availability_start"),
    ("availability_end", "s.availability_end"),
    ("total_units", "s.total_units"),
    ("one_week_media_cost", "s.one_week_media_cost"),
    ("two_week_media_cost", "s.two_week_media_cost"),
    ("three_week_media_cost", "s.three_week_media_cost"),
    ("four_week_media_cost", "s.four_week_media_cost"),
    ("installation_cost", "s.installation_cost"),
    ("markup_percentage", "s.markup_percentage"),
    ("production_cost", "s.production_cost"),
    ("taxes", "s.taxes"),
    ("four_week_rate_card", "s.four_week_rate_card"),
    ("latitude", "s.latitude"),
    ("longitude", "s.longitude"),
    ("no_of_periods", "s.no_of_periods"),
    ("cost_basis", "s.cost_basis"),
    ("selected", "s.selected"),
    ("user_locked", "s.user_locked"),
    ("created_at", "s.created_at"),
    ("updated_at", "s.updated_at"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(CoreError::Validation(format!(
                "Unknown sort order '{other}'. Must be 'asc' or 'desc'"
            ))),
        }
    }
}

/// A validated ordering: the column comes from the allow-list, never from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionSort {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl SubmissionSort {
    /// Resolve the `sort_column` / `sort_order` query parameters.
    ///
    /// Returns `Ok(None)` when no column was requested. An order without a
    /// column is ignored.
    pub fn parse(column: Option<&str>, order: Option<&str>) -> Result<Option<Self>, CoreError> {
        let Some(name) = column.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(None);
        };

        let column = SORTABLE_FIELDS
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, column)| *column)
            .ok_or_else(|| CoreError::Validation(format!("Cannot sort by '{name}'")))?;

        let direction = match order.map(str::trim).filter(|o| !o.is_empty()) {
            Some(order) => order.parse()?,
            None => SortDirection::default(),
        };

        Ok(Some(Self { column, direction }))
    }

    /// `ORDER BY` body, with the primary key as a tie-breaker.
    pub fn order_by(&self) -> String {
        format!("{} {} NULLS LAST, s.id ASC", self.column, self.direction.sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_column_means_no_sort() {
        assert_eq!(SubmissionSort::parse(None, Some("desc")).unwrap(), None);
        assert_eq!(SubmissionSort::parse(Some(""), None).unwrap(), None);
    }

    #[test]
    fn known_field_maps_to_column() {
        let sort = SubmissionSort::parse(Some("town"), Some("desc")).unwrap().unwrap();
        assert_eq!(sort.column, "s.town");
        assert_eq!(sort.direction, SortDirection::Desc);
        assert_eq!(sort.order_by(), "s.town DESC NULLS LAST, s.id ASC");
    }

    #[test]
    fn vendor_sorts_by_joined_name() {
        let sort = SubmissionSort::parse(Some("vendor"), None).unwrap().unwrap();
        assert_eq!(sort.column, "v.name");
        assert_eq!(sort.direction, SortDirection::Asc);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = SubmissionSort::parse(Some("id; DROP TABLE submissions"), None).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let err = SubmissionSort::parse(Some("town"), Some("sideways")).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
