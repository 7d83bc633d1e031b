//! Price history analysis

use super::{HistoryRange, PriceHistory};
use crate::shared::utils::calculate_percentage_change;

/// Trend over one history window
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSummary {
    pub range: HistoryRange,
    pub first: f64,
    pub last: f64,
    pub min: f64,
    pub max: f64,
    pub change_percentage: f64,
    pub samples: usize,
}

/// Analyzes price history and trends
pub struct PriceAnalyzer;

impl PriceAnalyzer {
    pub fn calculate_price_change(&self, old_price: f64, new_price: f64) -> f64 {
        calculate_percentage_change(old_price, new_price)
    }

    /// `None` for an empty history
    pub fn summarize(&self, history: &PriceHistory, range: HistoryRange) -> Option<TrendSummary> {
        let first = history.points.first()?.price;
        let last = history.points.last()?.price;
        let (min, max) = history
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.price), hi.max(p.price)));

        Some(TrendSummary {
            range,
            first,
            last,
            min,
            max,
            change_percentage: self.calculate_price_change(first, last),
            samples: history.points.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::HistoryPoint;
    use chrono::{TimeZone, Utc};

    fn history(prices: &[f64]) -> PriceHistory {
        PriceHistory {
            points: prices
                .iter()
                .enumerate()
                .map(|(i, &price)| HistoryPoint {
                    timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 3600, 0).unwrap(),
                    price,
                })
                .collect(),
        }
    }

    #[test]
    fn test_summarize_trend() {
        let summary = PriceAnalyzer
            .summarize(&history(&[100.0, 90.0, 130.0, 110.0]), HistoryRange::Week)
            .unwrap();
        assert_eq!(summary.first, 100.0);
        assert_eq!(summary.last, 110.0);
        assert_eq!(summary.min, 90.0);
        assert_eq!(summary.max, 130.0);
        assert!((summary.change_percentage - 10.0).abs() < 1e-9);
        assert_eq!(summary.samples, 4);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(PriceAnalyzer.summarize(&PriceHistory::default(), HistoryRange::Day).is_none());
    }
}
