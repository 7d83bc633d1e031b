use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::price::{HistoryRange, PriceFeed, PriceHistory, PriceNormalizer, PriceQuote, RawQuote};
use crate::shared::config::{ApiCfg, Config, DexCfg, TokenCfg};
use crate::shared::errors::PriceError;
use crate::shared::types::{PriceSource, Symbol};
use crate::shared::utils::render_template;

/// Price feed backed by the spot, dex, best-price, gas oracle and history APIs
pub struct HttpPriceFeed {
    http_client: Client,
    api: ApiCfg,
    dex: DexCfg,
    tokens: Vec<TokenCfg>,
    normalizer: PriceNormalizer,
}

impl HttpPriceFeed {
    pub fn new(config: &Config) -> Result<Self, PriceError> {
        let http_client = Client::builder()
            .timeout(Duration::from_millis(config.api.timeout_ms))
            .user_agent(concat!("pricelens/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            api: config.api.clone(),
            dex: config.dex.clone(),
            tokens: config.tokens.clone(),
            normalizer: PriceNormalizer::new(&config.dex),
        })
    }

    fn token(&self, symbol: &Symbol) -> Result<&TokenCfg, PriceError> {
        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol.as_str()))
            .ok_or_else(|| PriceError::UnknownSymbol(symbol.to_string()))
    }

    fn spot_url(&self, symbol: &Symbol) -> String {
        render_template(&self.api.spot_url, &[("symbol", symbol.as_str())])
    }

    fn best_url(&self, symbol: &Symbol) -> String {
        render_template(&self.api.best_url, &[("symbol", symbol.as_str())])
    }

    /// Sells the configured USD notional of the quote token for `symbol`
    fn dex_url(&self, symbol: &Symbol) -> Result<String, PriceError> {
        let token = self.token(symbol)?;
        let quote = &self.dex.quote_token;
        let amount = format!("{:.0}", self.dex.notional_usd * 10_f64.powi(quote.decimals as i32));
        let src_decimals = quote.decimals.to_string();
        let dest_decimals = token.decimals.to_string();

        Ok(render_template(
            &self.api.dex_url,
            &[
                ("src_token", quote.address.as_str()),
                ("dest_token", token.address.as_str()),
                ("src_decimals", src_decimals.as_str()),
                ("dest_decimals", dest_decimals.as_str()),
                ("amount", amount.as_str()),
            ],
        ))
    }

    fn history_url(&self, symbol: &Symbol, range: HistoryRange) -> Result<String, PriceError> {
        let token = self.token(symbol)?;
        let days = range.days().to_string();
        Ok(render_template(
            &self.api.history_url,
            &[("coin_id", token.coin_id.as_str()), ("days", days.as_str()), ("symbol", symbol.as_str())],
        ))
    }

    async fn get_json(&self, url: &str) -> Result<Value, PriceError> {
        debug!("🔍 GET {}", url);

        let response = self.http_client.get(url).send().await.map_err(|e| self.map_transport(e))?;
        if !response.status().is_success() {
            return Err(PriceError::Status(response.status().as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| PriceError::Decode(e.to_string()))
    }

    fn map_transport(&self, err: reqwest::Error) -> PriceError {
        if err.is_timeout() {
            PriceError::Timeout(self.api.timeout_ms)
        } else {
            PriceError::Http(err)
        }
    }

    async fn fetch_dex(&self, symbol: &Symbol) -> Result<PriceQuote, PriceError> {
        let response = self.get_json(&self.dex_url(symbol)?).await?;

        let gas_oracle = if self.normalizer.needs_gas_estimate(symbol, &response) {
            match self.get_json(&self.api.gas_url).await {
                Ok(raw) => Some(raw),
                Err(e) => {
                    warn!("⚠️ Gas oracle unavailable, {} fee left empty: {}", symbol, e);
                    None
                }
            }
        } else {
            None
        };

        Ok(self.normalizer.normalize(
            symbol,
            RawQuote::Dex {
                response: &response,
                gas_oracle: gas_oracle.as_ref(),
            },
        ))
    }
}

#[async_trait]
impl PriceFeed for HttpPriceFeed {
    async fn fetch_quote(&self, symbol: &Symbol, source: PriceSource) -> Result<PriceQuote, PriceError> {
        let quote = match source {
            PriceSource::Spot => {
                let raw = self.get_json(&self.spot_url(symbol)).await?;
                self.normalizer.normalize(symbol, RawQuote::Spot(&raw))
            }
            PriceSource::Dex => self.fetch_dex(symbol).await?,
            PriceSource::Best => {
                let raw = self.get_json(&self.best_url(symbol)).await?;
                self.normalizer.normalize(symbol, RawQuote::Best(&raw))
            }
        };

        if !quote.is_available() {
            info!("{} {} response had no usable price", symbol, source);
        }
        Ok(quote)
    }

    async fn fetch_history(&self, symbol: &Symbol, range: HistoryRange) -> Result<PriceHistory, PriceError> {
        let raw = self.get_json(&self.history_url(symbol, range)?).await?;
        Ok(self.normalizer.normalize_history(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> HttpPriceFeed {
        HttpPriceFeed::new(&Config::default()).unwrap()
    }

    fn sym(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    #[test]
    fn test_dex_url_sells_notional_of_quote_token() {
        let url = feed().dex_url(&sym("link")).unwrap();
        assert!(url.contains("srcToken=0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"));
        assert!(url.contains("destToken=0x514910771AF9Ca656af840dff83E8264EcF986CA"));
        assert!(url.contains("amount=10000000000&"));
        assert!(url.contains("srcDecimals=6&"));
        assert!(url.contains("destDecimals=18&"));
    }

    #[test]
    fn test_spot_and_best_urls() {
        let f = feed();
        assert_eq!(f.spot_url(&sym("eth")), "https://api.binance.com/api/v3/ticker/price?symbol=ETHUSDT");
        assert!(f.best_url(&sym("btc")).ends_with("/best/BTC"));
    }

    #[test]
    fn test_history_url_uses_coin_id() {
        let url = feed().history_url(&sym("BTC"), HistoryRange::Month).unwrap();
        assert!(url.contains("/coins/bitcoin/market_chart"));
        assert!(url.ends_with("days=30"));
    }

    #[test]
    fn test_unknown_symbol() {
        assert!(matches!(feed().dex_url(&sym("DOGE")), Err(PriceError::UnknownSymbol(_))));
    }
}
