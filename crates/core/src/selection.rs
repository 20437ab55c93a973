//! Aggregate statistics over the selected submissions of a project.

use serde::Serialize;

/// The inputs one selected submission contributes to the aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SelectedUnit {
    pub weekly_impressions: Option<i64>,
    pub total_media_cost: Option<f64>,
}

/// Totals over a project's selected submissions.
///
/// `impressions` is `None` when no selected submission carries an impressions
/// figure (SUM over nothing).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SelectionStats {
    pub selected: i64,
    pub impressions: Option<i64>,
    pub cpm: f64,
    pub estimated_budget: f64,
}

impl SelectionStats {
    /// Fold selected units into totals.
    ///
    /// Units without impressions or without a defined media cost simply do not
    /// contribute to that sum; they still count as selected.
    pub fn from_units<I>(units: I) -> Self
    where
        I: IntoIterator<Item = SelectedUnit>,
    {
        let mut selected = 0_i64;
        let mut impressions: Option<i64> = None;
        let mut media_cost = 0.0_f64;

        for unit in units {
            selected += 1;
            if let Some(value) = unit.weekly_impressions {
                impressions = Some(impressions.unwrap_or(0) + value);
            }
            if let Some(cost) = unit.total_media_cost {
                media_cost += cost;
            }
        }

        Self {
            selected,
            impressions,
            cpm: cpm(media_cost, impressions),
            estimated_budget: media_cost,
        }
    }
}

/// Cost per thousand impressions; zero when there are no impressions.
pub fn cpm(media_cost: f64, impressions: Option<i64>) -> f64 {
    match impressions {
        Some(total) if total > 0 => media_cost / total as f64 * 1000.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(impressions: Option<i64>, cost: Option<f64>) -> SelectedUnit {
        SelectedUnit {
            weekly_impressions: impressions,
            total_media_cost: cost,
        }
    }

    #[test]
    fn two_selected_units() {
        let stats = SelectionStats::from_units([
            unit(Some(1000), Some(100.0)),
            unit(Some(2000), Some(100.0)),
        ]);

        assert_eq!(stats.selected, 2);
        assert_eq!(stats.impressions, Some(3000));
        assert_eq!(stats.estimated_budget, 200.0);
        assert!((stats.cpm - 66.666_666).abs() < 1e-3, "cpm was {}", stats.cpm);
    }

    #[test]
    fn nothing_selected() {
        let stats = SelectionStats::from_units(std::iter::empty());
        assert_eq!(stats.selected, 0);
        assert_eq!(stats.impressions, None);
        assert_eq!(stats.cpm, 0.0);
        assert_eq!(stats.estimated_budget, 0.0);
    }

    #[test]
    fn undefined_costs_are_skipped() {
        let stats =
            SelectionStats::from_units([unit(Some(500), None), unit(Some(500), Some(40.0))]);
        assert_eq!(stats.selected, 2);
        assert_eq!(stats.estimated_budget, 40.0);
        assert_eq!(stats.cpm, 40.0);
    }

    #[test]
    fn zero_impressions_gives_zero_cpm() {
        let stats = SelectionStats::from_units([unit(Some(0), Some(75.0)), unit(None, Some(25.0))]);
        assert_eq!(stats.impressions, Some(0));
        assert_eq!(stats.estimated_budget, 100.0);
        assert_eq!(stats.cpm, 0.0);
    }

    #[test]
    fn missing_impressions_gives_zero_cpm() {
        let stats = SelectionStats::from_units([unit(None, Some(75.0))]);
        assert_eq!(stats.impressions, None);
        assert_eq!(stats.cpm, 0.0);
    }
}
