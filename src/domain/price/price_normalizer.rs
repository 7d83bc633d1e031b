//! Converts raw upstream responses into canonical quotes
//!
//! Nothing in here returns an error: a response that cannot be read the
//! expected way yields an unavailable quote.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{HistoryPoint, PriceHistory, PriceQuote};
use crate::shared::config::DexCfg;
use crate::shared::types::{PriceSource, Symbol};

/// Upstream numbers arrive either as JSON numbers or numeric strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    Text(String),
}

impl LenientNumber {
    fn as_f64(&self) -> Option<f64> {
        let v = match self {
            LenientNumber::Number(n) => *n,
            LenientNumber::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }
}

#[derive(Debug, Deserialize)]
struct SpotResponse {
    price: Option<LenientNumber>,
}

#[derive(Debug, Deserialize)]
struct DexResponse {
    price: Option<DexPriceRoute>,
}

#[derive(Debug, Deserialize)]
struct DexPriceRoute {
    #[serde(rename = "destAmount")]
    dest_amount: Option<LenientNumber>,
    #[serde(rename = "destDecimals")]
    dest_decimals: Option<LenientNumber>,
    #[serde(rename = "gasCostUSD")]
    gas_cost_usd: Option<LenientNumber>,
}

#[derive(Debug, Deserialize)]
struct BestResponse {
    best_price: Option<BestPrice>,
}

#[derive(Debug, Deserialize)]
struct BestPrice {
    price_usd: Option<LenientNumber>,
}

#[derive(Debug, Deserialize)]
struct GasOracleResponse {
    result: Option<GasOracleResult>,
}

#[derive(Debug, Deserialize)]
struct GasOracleResult {
    #[serde(rename = "ProposeGasPrice")]
    propose_gas_price: Option<LenientNumber>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    prices: Vec<Value>,
}

fn decode<'a, T: Deserialize<'a>>(raw: &'a Value) -> Option<T> {
    match T::deserialize(raw) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!("Unusable response shape: {}", e);
            None
        }
    }
}

/// Raw response for one source, as fetched
#[derive(Debug, Clone, Copy)]
pub enum RawQuote<'a> {
    Spot(&'a Value),
    Dex {
        response: &'a Value,
        gas_oracle: Option<&'a Value>,
    },
    Best(&'a Value),
}

impl RawQuote<'_> {
    pub fn source(&self) -> PriceSource {
        match self {
            RawQuote::Spot(_) => PriceSource::Spot,
            RawQuote::Dex { .. } => PriceSource::Dex,
            RawQuote::Best(_) => PriceSource::Best,
        }
    }
}

/// Turns heterogeneous feed responses into comparable USD prices
#[derive(Debug, Clone)]
pub struct PriceNormalizer {
    notional_usd: f64,
    native_symbol: String,
    gas_units: f64,
    gwei_usd_rate: f64,
}

impl PriceNormalizer {
    pub fn new(cfg: &DexCfg) -> Self {
        Self {
            notional_usd: cfg.notional_usd,
            native_symbol: cfg.native_symbol.to_uppercase(),
            gas_units: cfg.gas_units,
            gwei_usd_rate: cfg.gwei_usd_rate,
        }
    }

    pub fn normalize(&self, symbol: &Symbol, raw: RawQuote<'_>) -> PriceQuote {
        match raw {
            RawQuote::Spot(response) => self.normalize_spot(response),
            RawQuote::Dex { response, gas_oracle } => self.normalize_dex(symbol, response, gas_oracle),
            RawQuote::Best(response) => self.normalize_best(response),
        }
    }

    fn normalize_spot(&self, response: &Value) -> PriceQuote {
        let value = decode::<SpotResponse>(response)
            .and_then(|r| r.price)
            .and_then(|p| p.as_f64());
        PriceQuote::new(PriceSource::Spot, value, None)
    }

    fn normalize_best(&self, response: &Value) -> PriceQuote {
        let value = decode::<BestResponse>(response)
            .and_then(|r| r.best_price)
            .and_then(|b| b.price_usd)
            .and_then(|p| p.as_f64());
        PriceQuote::new(PriceSource::Best, value, None)
    }

    /// price = notional / (destAmount / 10^destDecimals)
    fn normalize_dex(&self, symbol: &Symbol, response: &Value, gas_oracle: Option<&Value>) -> PriceQuote {
        let Some(route) = decode::<DexResponse>(response).and_then(|r| r.price) else {
            return PriceQuote::unavailable(PriceSource::Dex);
        };

        let dest_amount = route.dest_amount.as_ref().and_then(LenientNumber::as_f64);
        let dest_decimals = route
            .dest_decimals
            .as_ref()
            .and_then(LenientNumber::as_f64)
            .filter(|d| d.fract() == 0.0 && (0.0..=255.0).contains(d));

        let value = match (dest_amount, dest_decimals) {
            (Some(amount), Some(decimals)) if amount > 0.0 => {
                let bought = amount / 10_f64.powi(decimals as i32);
                Some(self.notional_usd / bought).filter(|p| p.is_finite() && *p > 0.0)
            }
            _ => None,
        };

        if value.is_none() {
            return PriceQuote::unavailable(PriceSource::Dex);
        }

        let fee = match route.gas_cost_usd.as_ref().and_then(LenientNumber::as_f64) {
            Some(explicit) => Some(explicit),
            None if self.is_native(symbol) => gas_oracle.and_then(|raw| self.estimate_native_fee(raw)),
            None => None,
        };

        PriceQuote::new(PriceSource::Dex, value, fee)
    }

    /// Whether a Dex response for `symbol` has to be paired with a gas oracle read
    pub fn needs_gas_estimate(&self, symbol: &Symbol, dex_response: &Value) -> bool {
        if !self.is_native(symbol) {
            return false;
        }
        decode::<DexResponse>(dex_response)
            .and_then(|r| r.price)
            .map_or(false, |route| route.gas_cost_usd.as_ref().and_then(LenientNumber::as_f64).is_none())
    }

    fn is_native(&self, symbol: &Symbol) -> bool {
        symbol.as_str() == self.native_symbol
    }

    /// baseFee(gwei) x gas units x USD-per-gwei
    fn estimate_native_fee(&self, raw: &Value) -> Option<f64> {
        let gwei = decode::<GasOracleResponse>(raw)?
            .result?
            .propose_gas_price?
            .as_f64()?;
        let fee = gwei * self.gas_units * self.gwei_usd_rate;
        (fee.is_finite() && fee >= 0.0).then_some(fee)
    }

    /// `{prices: [[timestampMillis, price], ...]}`; malformed points are dropped
    pub fn normalize_history(&self, response: &Value) -> PriceHistory {
        let Some(parsed) = decode::<HistoryResponse>(response) else {
            return PriceHistory::default();
        };

        let mut points: Vec<HistoryPoint> = parsed
            .prices
            .iter()
            .filter_map(|entry| {
                let pair = entry.as_array()?;
                let ts = pair.first()?.as_f64()?;
                let price = pair.get(1)?.as_f64()?;
                if !price.is_finite() || price < 0.0 {
                    return None;
                }
                let timestamp = DateTime::<Utc>::from_timestamp_millis(ts as i64)?;
                Some(HistoryPoint { timestamp, price })
            })
            .collect();
        points.sort_by_key(|p| p.timestamp);

        PriceHistory { points }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalizer() -> PriceNormalizer {
        PriceNormalizer::new(&DexCfg::default())
    }

    fn eth() -> Symbol {
        Symbol::parse("ETH").unwrap()
    }

    fn link() -> Symbol {
        Symbol::parse("LINK").unwrap()
    }

    #[test]
    fn test_spot_reads_price_field() {
        let n = normalizer();
        let quote = n.normalize(&eth(), RawQuote::Spot(&json!({"price": 2000.5})));
        assert_eq!(quote.value, Some(2000.5));

        let quote = n.normalize(&eth(), RawQuote::Spot(&json!({"symbol": "ETHUSDT", "price": "1999.10"})));
        assert_eq!(quote.value, Some(1999.1));
    }

    #[test]
    fn test_spot_malformed_is_unavailable() {
        let n = normalizer();
        for raw in [json!({}), json!({"price": "abc"}), json!([1, 2]), json!(null), json!({"price": {"usd": 1}})] {
            let quote = n.normalize(&eth(), RawQuote::Spot(&raw));
            assert_eq!(quote.source, PriceSource::Spot);
            assert!(!quote.is_available(), "expected unavailable for {}", raw);
        }
    }

    #[test]
    fn test_dex_canonical_price() {
        let n = normalizer();
        // 10000 USD buys 20 tokens
        let raw = json!({"price": {"destAmount": "20000000", "destDecimals": 6}});
        let quote = n.normalize(&link(), RawQuote::Dex { response: &raw, gas_oracle: None });
        assert_eq!(quote.value, Some(500.0));
        assert_eq!(quote.fee, None);

        let raw = json!({"price": {"destAmount": "2000000000", "destDecimals": 6}});
        let quote = n.normalize(&link(), RawQuote::Dex { response: &raw, gas_oracle: None });
        assert_eq!(quote.value, Some(5.0));
    }

    #[test]
    fn test_dex_non_positive_or_missing_amount_is_unavailable() {
        let n = normalizer();
        let cases = [
            json!({"price": {"destAmount": "0", "destDecimals": 6}}),
            json!({"price": {"destAmount": "-5", "destDecimals": 6}}),
            json!({"price": {"destDecimals": 6}}),
            json!({"price": {"destAmount": "", "destDecimals": 6}}),
            json!({"price": {"destAmount": "1e-320", "destDecimals": 0}}),
            json!({"price": {"destAmount": "100", "destDecimals": 2.5}}),
            json!({"price": null}),
            json!({"error": "No routes found"}),
        ];
        for raw in cases {
            let quote = n.normalize(&link(), RawQuote::Dex { response: &raw, gas_oracle: None });
            assert_eq!(quote.value, None, "expected unavailable for {}", raw);
        }
    }

    #[test]
    fn test_dex_explicit_gas_cost() {
        let n = normalizer();
        let raw = json!({"price": {"destAmount": "5000000000000000000", "destDecimals": 18, "gasCostUSD": "3.25"}});
        let quote = n.normalize(&eth(), RawQuote::Dex { response: &raw, gas_oracle: None });
        assert_eq!(quote.value, Some(2000.0));
        assert_eq!(quote.fee, Some(3.25));
        assert!(!n.needs_gas_estimate(&eth(), &raw));
    }

    #[test]
    fn test_dex_native_fee_estimate() {
        let n = normalizer();
        let raw = json!({"price": {"destAmount": "5000000000000000000", "destDecimals": 18}});
        let gas = json!({"status": "1", "result": {"ProposeGasPrice": "20"}});
        assert!(n.needs_gas_estimate(&eth(), &raw));
        assert!(!n.needs_gas_estimate(&link(), &raw));

        let quote = n.normalize(&eth(), RawQuote::Dex { response: &raw, gas_oracle: Some(&gas) });
        let fee = quote.fee.unwrap();
        assert!((fee - 20.0 * 21_000.0 * 0.000_002).abs() < 1e-9);

        // Non-native assets never get an estimated fee
        let quote = n.normalize(&link(), RawQuote::Dex { response: &raw, gas_oracle: Some(&gas) });
        assert_eq!(quote.fee, None);
    }

    #[test]
    fn test_best_reads_nested_field() {
        let n = normalizer();
        let quote = n.normalize(&eth(), RawQuote::Best(&json!({"best_price": {"price_usd": 1990.0}})));
        assert_eq!(quote.value, Some(1990.0));

        let quote = n.normalize(&eth(), RawQuote::Best(&json!({"best_price": {}})));
        assert!(!quote.is_available());
    }

    #[test]
    fn test_history_drops_malformed_points() {
        let n = normalizer();
        let raw = json!({"prices": [
            [1_700_000_100_000_i64, 2010.0],
            [1_700_000_000_000_i64, 2000.0],
            ["bad", 1.0],
            [1_700_000_200_000_i64],
            [1_700_000_300_000_i64, -4.0]
        ]});
        let history = n.normalize_history(&raw);
        assert_eq!(history.points.len(), 2);
        assert_eq!(history.points[0].price, 2000.0);
        assert_eq!(history.points[1].price, 2010.0);

        assert!(n.normalize_history(&json!("oops")).is_empty());
    }
}
