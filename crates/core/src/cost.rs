//! Submission cost derivation.
//!
//! A submission quotes up to four per-period prices (one to four weeks). The
//! [`CostBasis`] selects which of them is the unit price; multiplying it by
//! the number of booked periods gives the total media cost. Neither derived
//! value is stored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Which quoted price is used as the per-period unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CostBasis {
    #[serde(rename = "One Week Media Cost")]
    OneWeek,
    #[serde(rename = "Two Week Media Cost")]
    TwoWeek,
    #[serde(rename = "Three Week Media Cost")]
    ThreeWeek,
    #[default]
    #[serde(rename = "Four Week Media Cost")]
    FourWeek,
}

impl CostBasis {
    pub const ALL: [CostBasis; 4] = [
        CostBasis::OneWeek,
        CostBasis::TwoWeek,
        CostBasis::ThreeWeek,
        CostBasis::FourWeek,
    ];

    /// Column value; also the name of the price column it selects.
    pub fn as_str(self) -> &'static str {
        match self {
            CostBasis::OneWeek => "one_week_media_cost",
            CostBasis::TwoWeek => "two_week_media_cost",
            CostBasis::ThreeWeek => "three_week_media_cost",
            CostBasis::FourWeek => "four_week_media_cost",
        }
    }

    /// Wire label.
    pub fn label(self) -> &'static str {
        match self {
            CostBasis::OneWeek => "One Week Media Cost",
            CostBasis::TwoWeek => "Two Week Media Cost",
            CostBasis::ThreeWeek => "Three Week Media Cost",
            CostBasis::FourWeek => "Four Week Media Cost",
        }
    }
}

impl fmt::Display for CostBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CostBasis {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CostBasis::ALL
            .into_iter()
            .find(|basis| basis.label() == s || basis.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown cost basis '{s}'")))
    }
}

impl TryFrom<String> for CostBasis {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The four quoted per-period prices of a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MediaPrices {
    pub one_week: Option<f64>,
    pub two_week: Option<f64>,
    pub three_week: Option<f64>,
    pub four_week: Option<f64>,
}

impl MediaPrices {
    pub fn price_at(&self, basis: CostBasis) -> Option<f64> {
        match basis {
            CostBasis::OneWeek => self.one_week,
            CostBasis::TwoWeek => self.two_week,
            CostBasis::ThreeWeek => self.three_week,
            CostBasis::FourWeek => self.four_week,
        }
    }
}

/// `no_of_periods * price_at(basis)`, or `None` when either is missing.
pub fn total_media_cost(
    prices: &MediaPrices,
    basis: CostBasis,
    no_of_periods: Option<i32>,
) -> Option<f64> {
    let periods = no_of_periods?;
    let unit_price = prices.price_at(basis)?;
    Some(f64::from(periods) * unit_price)
}

/// Media cost plus production plus markup on the media cost.
///
/// `None` unless all three inputs are present. Not surfaced in any response.
pub fn total_cost(
    total_media_cost: Option<f64>,
    production_cost: Option<f64>,
    markup_percentage: Option<f64>,
) -> Option<f64> {
    let media = total_media_cost?;
    Some(media + production_cost? + markup_percentage? * media)
}
