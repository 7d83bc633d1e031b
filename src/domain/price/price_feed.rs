//! Price feed port

use async_trait::async_trait;
use tracing::warn;

use super::{HistoryRange, PriceHistory, PriceQuote};
use crate::shared::errors::PriceError;
use crate::shared::types::{PriceSource, Symbol};

/// Fetches a fresh quote or history for a symbol
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn fetch_quote(&self, symbol: &Symbol, source: PriceSource) -> Result<PriceQuote, PriceError>;

    async fn fetch_history(&self, symbol: &Symbol, range: HistoryRange) -> Result<PriceHistory, PriceError>;

    /// Failed fetches degrade to an unavailable quote
    async fn quote_or_unavailable(&self, symbol: &Symbol, source: PriceSource) -> PriceQuote {
        match self.fetch_quote(symbol, source).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!("⚠️ {} {} price unavailable: {}", symbol, source, e);
                PriceQuote::unavailable(source)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::mock::ScriptedPriceFeed;
    use super::*;

    #[tokio::test]
    async fn test_quote_or_unavailable_degrades_errors() {
        let feed = ScriptedPriceFeed::new();
        feed.set_failure("ETH", PriceSource::Spot);
        feed.set_price("ETH", PriceSource::Dex, Some(2001.0));

        let eth = Symbol::parse("ETH").unwrap();
        let spot = feed.quote_or_unavailable(&eth, PriceSource::Spot).await;
        assert_eq!(spot.source, PriceSource::Spot);
        assert!(!spot.is_available());

        let dex = feed.quote_or_unavailable(&eth, PriceSource::Dex).await;
        assert_eq!(dex.value, Some(2001.0));
        assert_eq!(feed.fetch_count(), 2);
    }
}
