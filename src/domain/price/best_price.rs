//! Best-price selection across sources

use super::PriceQuote;
use crate::shared::types::PriceSource;

/// Quotes from every source for one symbol
#[derive(Debug, Clone)]
pub struct SourceQuotes {
    pub spot: PriceQuote,
    pub dex: PriceQuote,
    pub best: PriceQuote,
}

impl SourceQuotes {
    pub fn iter(&self) -> impl Iterator<Item = &PriceQuote> {
        [&self.spot, &self.dex, &self.best].into_iter()
    }
}

/// Picks the comparison price: an explicit Best quote wins, otherwise the
/// cheapest of Spot and Dex.
pub struct BestPriceSelector;

impl BestPriceSelector {
    pub fn select_best(&self, quotes: &SourceQuotes) -> Option<f64> {
        if let Some(best) = quotes.best.value {
            return Some(best);
        }

        let min = [quotes.spot.value, quotes.dex.value]
            .into_iter()
            .flatten()
            .fold(f64::INFINITY, f64::min);

        // INFINITY is the "no minimum" sentinel
        min.is_finite().then_some(min)
    }

    /// Sources whose quote equals the selected best price
    pub fn cheapest_sources(&self, quotes: &SourceQuotes) -> Vec<PriceSource> {
        let Some(best) = self.select_best(quotes) else {
            return Vec::new();
        };
        quotes
            .iter()
            .filter(|q| q.value == Some(best))
            .map(|q| q.source)
            .collect()
    }
}
