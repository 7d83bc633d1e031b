//! Price domain - normalization, best-price selection and history analysis

mod best_price;
mod price_analyzer;
mod price_feed;
mod price_normalizer;

pub use best_price::{BestPriceSelector, SourceQuotes};
pub use price_analyzer::{PriceAnalyzer, TrendSummary};
pub use price_feed::PriceFeed;
pub use price_normalizer::{PriceNormalizer, RawQuote};

#[cfg(test)]
pub use price_feed::mock;

use crate::shared::types::PriceSource;
use chrono::{DateTime, Utc};

/// Canonical price for one source, produced fresh on every fetch
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub source: PriceSource,
    pub value: Option<f64>,
    /// Associated network/trade cost in USD
    pub fee: Option<f64>,
    pub fetched_at: DateTime<Utc>,
}

impl PriceQuote {
    /// Non-finite or negative inputs become absent
    pub fn new(source: PriceSource, value: Option<f64>, fee: Option<f64>) -> Self {
        Self {
            source,
            value: value.filter(|v| usable(*v)),
            fee: fee.filter(|f| usable(*f)),
            fetched_at: Utc::now(),
        }
    }

    pub fn unavailable(source: PriceSource) -> Self {
        Self::new(source, None, None)
    }

    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }
}

fn usable(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

/// One point of a price history series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Price history ordered by timestamp
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    pub points: Vec<HistoryPoint>,
}

impl PriceHistory {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Supported history windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl HistoryRange {
    pub const ALL: [HistoryRange; 5] = [
        HistoryRange::Day,
        HistoryRange::Week,
        HistoryRange::Month,
        HistoryRange::Quarter,
        HistoryRange::Year,
    ];

    pub fn days(&self) -> u32 {
        match self {
            HistoryRange::Day => 1,
            HistoryRange::Week => 7,
            HistoryRange::Month => 30,
            HistoryRange::Quarter => 90,
            HistoryRange::Year => 365,
        }
    }

    /// Clamp an arbitrary day count to the nearest supported window
    pub fn from_days(days: u32) -> Self {
        Self::ALL
            .into_iter()
            .min_by_key(|range| range.days().abs_diff(days))
            .unwrap_or(HistoryRange::Week)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_rejects_unusable_values() {
        let quote = PriceQuote::new(PriceSource::Dex, Some(f64::NAN), Some(-1.0));
        assert_eq!(quote.value, None);
        assert_eq!(quote.fee, None);
        assert!(!quote.is_available());

        let quote = PriceQuote::new(PriceSource::Spot, Some(2000.0), None);
        assert_eq!(quote.value, Some(2000.0));
    }

    #[test]
    fn test_history_range_clamps() {
        assert_eq!(HistoryRange::from_days(0), HistoryRange::Day);
        assert_eq!(HistoryRange::from_days(7), HistoryRange::Week);
        assert_eq!(HistoryRange::from_days(14), HistoryRange::Week);
        assert_eq!(HistoryRange::from_days(60), HistoryRange::Month);
        assert_eq!(HistoryRange::from_days(1000), HistoryRange::Year);
    }
}
