//! Application services and use cases

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::domain::alert::{Alert, AlertDirection, AlertId, AlertStore, AlertValidator};
use crate::domain::price::{
    BestPriceSelector, HistoryRange, PriceAnalyzer, PriceFeed, PriceHistory, SourceQuotes, TrendSummary,
};
use crate::shared::errors::{AppError, ValidationError};
use crate::shared::types::{PriceSource, Symbol};

/// All three source quotes for a symbol plus the selected best price
#[derive(Debug, Clone)]
pub struct PriceComparison {
    pub symbol: Symbol,
    pub quotes: SourceQuotes,
    pub best: Option<f64>,
    pub cheapest: Vec<PriceSource>,
}

/// History series with its trend summary
#[derive(Debug, Clone)]
pub struct HistoryReport {
    pub symbol: Symbol,
    pub range: HistoryRange,
    pub history: PriceHistory,
    pub summary: Option<TrendSummary>,
}

/// Request to create a threshold alert, as entered by the user
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub symbol: String,
    pub target: String,
    pub direction: AlertDirection,
    pub source: PriceSource,
}

/// Comparison, history and alert management use cases
pub struct PriceService {
    feed: Arc<dyn PriceFeed>,
    store: Arc<AlertStore>,
}

impl PriceService {
    pub fn new(feed: Arc<dyn PriceFeed>, store: Arc<AlertStore>) -> Self {
        Self { feed, store }
    }

    pub fn store(&self) -> &Arc<AlertStore> {
        &self.store
    }

    fn parse_symbol(raw: &str) -> Result<Symbol, AppError> {
        Symbol::parse(raw).ok_or_else(|| AppError::InvalidInput("symbol must not be empty".to_string()))
    }

    /// Fetches every source concurrently; a failing source shows as unavailable
    pub async fn compare(&self, symbol: &str) -> Result<PriceComparison, AppError> {
        let symbol = Self::parse_symbol(symbol)?;

        let (spot, dex, best) = futures::join!(
            self.feed.quote_or_unavailable(&symbol, PriceSource::Spot),
            self.feed.quote_or_unavailable(&symbol, PriceSource::Dex),
            self.feed.quote_or_unavailable(&symbol, PriceSource::Best),
        );
        let quotes = SourceQuotes { spot, dex, best };

        let selector = BestPriceSelector;
        Ok(PriceComparison {
            best: selector.select_best(&quotes),
            cheapest: selector.cheapest_sources(&quotes),
            symbol,
            quotes,
        })
    }

    pub async fn history(&self, symbol: &str, days: u32) -> Result<HistoryReport, AppError> {
        let symbol = Self::parse_symbol(symbol)?;
        let range = HistoryRange::from_days(days);
        let history = self.feed.fetch_history(&symbol, range).await?;
        let summary = PriceAnalyzer.summarize(&history, range);

        Ok(HistoryReport {
            symbol,
            range,
            history,
            summary,
        })
    }

    /// Current price for the alert's (symbol, source) pair, `None` if unavailable
    pub async fn reference_price(&self, symbol: &Symbol, source: PriceSource) -> Option<f64> {
        self.feed.quote_or_unavailable(symbol, source).await.value
    }

    /// Validates against the live price and stores the alert on success
    pub async fn create_alert(&self, request: NewAlert) -> Result<Alert, AppError> {
        let symbol = Self::parse_symbol(&request.symbol)?;
        let current = self.reference_price(&symbol, request.source).await;

        let target = AlertValidator.validate(&request.target, current, request.direction)?;
        let reference_price = current.ok_or(ValidationError::NoReferencePrice)?;

        let alert = Alert {
            id: self.store.next_id(),
            symbol,
            target_price: target,
            reference_price,
            direction: request.direction,
            source: request.source,
            created_at: Utc::now(),
        };

        if !self.store.add(alert.clone()).await {
            return Err(AppError::InvalidInput(format!("alert {} already exists", alert.id)));
        }
        info!(
            "✅ Alert {} created: {} {} {} {}",
            alert.id, alert.symbol, alert.source, alert.direction, alert.target_price
        );
        Ok(alert)
    }

    pub async fn list_alerts(&self) -> Vec<Alert> {
        self.store.list().await.as_ref().clone()
    }

    pub async fn remove_alert(&self, id: AlertId) -> Result<(), AppError> {
        if self.store.remove(id).await {
            info!("🗑️ Alert {} removed", id);
            Ok(())
        } else {
            Err(AppError::AlertNotFound(id.to_string()))
        }
    }
}
