//! Configuration loading

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, ops::RangeInclusive};

use crate::shared::errors::AppError;

const DEFAULT_CONFIG_FILE: &str = "Config.toml";
const TOAST_RANGE_SECS: RangeInclusive<u64> = 3..=5;

/// Upstream endpoint templates
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiCfg {
    /// `{symbol}`
    pub spot_url: String,
    /// `{src_token}`, `{dest_token}`, `{src_decimals}`, `{dest_decimals}`, `{amount}`
    pub dex_url: String,
    /// `{symbol}`
    pub best_url: String,
    pub gas_url: String,
    /// `{coin_id}`, `{days}`
    pub history_url: String,
    pub timeout_ms: u64,
}

impl Default for ApiCfg {
    fn default() -> Self {
        Self {
            spot_url: "https://api.binance.com/api/v3/ticker/price?symbol={symbol}USDT".to_string(),
            dex_url: "https://apiv5.paraswap.io/prices?srcToken={src_token}&destToken={dest_token}&amount={amount}&srcDecimals={src_decimals}&destDecimals={dest_decimals}&side=SELL&network=1".to_string(),
            best_url: "https://api.pricelens.io/v1/best/{symbol}".to_string(),
            gas_url: "https://api.etherscan.io/api?module=gastracker&action=gasoracle".to_string(),
            history_url: "https://api.coingecko.com/api/v3/coins/{coin_id}/market_chart?vs_currency=usd&days={days}".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Quote token the Dex notional is denominated in
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteTokenCfg {
    pub address: String,
    pub decimals: u8,
}

/// Dex quote parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DexCfg {
    /// USD amount sold on every quote request
    pub notional_usd: f64,
    pub quote_token: QuoteTokenCfg,
    /// Symbol whose fee falls back to the gas oracle estimate
    pub native_symbol: String,
    pub gas_units: f64,
    /// USD per gwei of gas spent
    pub gwei_usd_rate: f64,
}

impl Default for DexCfg {
    fn default() -> Self {
        Self {
            notional_usd: 10_000.0,
            quote_token: QuoteTokenCfg {
                address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
                decimals: 6,
            },
            native_symbol: "ETH".to_string(),
            gas_units: 21_000.0,
            gwei_usd_rate: 0.000_002,
        }
    }
}

/// Token registry entry
#[derive(Debug, Clone, Deserialize)]
pub struct TokenCfg {
    pub symbol: String,
    /// Identifier used by the history endpoint
    pub coin_id: String,
    pub address: String,
    pub decimals: u8,
}

/// Alert monitor settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorCfg {
    pub interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub toast_secs: u64,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            fetch_timeout_secs: 15,
            toast_secs: 4,
        }
    }
}

impl MonitorCfg {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.toast_secs)
    }
}

/// Alert persistence settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageCfg {
    pub path: PathBuf,
    pub key: String,
}

impl Default for StorageCfg {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pricelens-state.json"),
            key: "price_alerts".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiCfg,
    pub dex: DexCfg,
    pub tokens: Vec<TokenCfg>,
    pub monitor: MonitorCfg,
    pub storage: StorageCfg,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiCfg::default(),
            dex: DexCfg::default(),
            tokens: default_tokens(),
            monitor: MonitorCfg::default(),
            storage: StorageCfg::default(),
        }
    }
}

fn default_tokens() -> Vec<TokenCfg> {
    vec![
        TokenCfg {
            symbol: "ETH".to_string(),
            coin_id: "ethereum".to_string(),
            address: "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE".to_string(),
            decimals: 18,
        },
        TokenCfg {
            symbol: "BTC".to_string(),
            coin_id: "bitcoin".to_string(),
            address: "0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599".to_string(), // WBTC
            decimals: 8,
        },
        TokenCfg {
            symbol: "LINK".to_string(),
            coin_id: "chainlink".to_string(),
            address: "0x514910771AF9Ca656af840dff83E8264EcF986CA".to_string(),
            decimals: 18,
        },
    ]
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let cfg: Self = toml::from_str(&s).context("parse Config.toml")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Explicit path must exist; otherwise `Config.toml` is used when present,
    /// falling back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.monitor.interval_secs == 0 {
            return Err(AppError::ConfigError("monitor.interval_secs must be positive".to_string()));
        }
        if !TOAST_RANGE_SECS.contains(&self.monitor.toast_secs) {
            return Err(AppError::ConfigError(format!(
                "monitor.toast_secs must be between {} and {}",
                TOAST_RANGE_SECS.start(),
                TOAST_RANGE_SECS.end()
            )));
        }
        if !(self.dex.notional_usd.is_finite() && self.dex.notional_usd > 0.0) {
            return Err(AppError::ConfigError("dex.notional_usd must be positive".to_string()));
        }
        if self.storage.key.trim().is_empty() {
            return Err(AppError::ConfigError("storage.key must not be empty".to_string()));
        }
        Ok(())
    }
}
