//! Alert domain - threshold alerts, validation, storage and notifications

mod alert_store;
mod alert_validator;
mod notification;

pub use alert_store::{AlertPersistence, AlertStore};
pub use alert_validator::{AlertValidator, MAX_DEVIATION};
pub use notification::{Notification, Notifier};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::types::{PriceSource, Symbol};

/// Monotonic alert identifier derived from the creation time in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub u64);

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AlertId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(AlertId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertDirection {
    Above,
    Below,
}

impl AlertDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertDirection::Above => "above",
            AlertDirection::Below => "below",
        }
    }
}

impl fmt::Display for AlertDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AlertDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "above" | "up" => Ok(AlertDirection::Above),
            "below" | "down" => Ok(AlertDirection::Below),
            _ => Err(anyhow::anyhow!("Unknown alert direction: {}", s)),
        }
    }
}

/// A user-defined threshold on one (symbol, source) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    pub symbol: Symbol,
    pub target_price: f64,
    #[serde(rename = "referencePriceAtCreation")]
    pub reference_price: f64,
    pub direction: AlertDirection,
    pub source: PriceSource,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Inclusive: touching the target counts as a trigger
    pub fn is_triggered_by(&self, price: f64) -> bool {
        match self.direction {
            AlertDirection::Above => price >= self.target_price,
            AlertDirection::Below => price <= self.target_price,
        }
    }
}

/// Emitted once when an alert's threshold is crossed
#[derive(Debug, Clone, PartialEq)]
pub struct AlertTrigger {
    pub alert_id: AlertId,
    pub symbol: Symbol,
    pub source: PriceSource,
    pub direction: AlertDirection,
    pub target_price: f64,
    pub price: f64,
    pub triggered_at: DateTime<Utc>,
}

impl AlertTrigger {
    pub fn new(alert: &Alert, price: f64) -> Self {
        Self {
            alert_id: alert.id,
            symbol: alert.symbol.clone(),
            source: alert.source,
            direction: alert.direction,
            target_price: alert.target_price,
            price,
            triggered_at: Utc::now(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::alert;
    use super::*;

    #[test]
    fn test_trigger_boundary_is_inclusive() {
        let above = alert(1, "ETH", PriceSource::Spot, AlertDirection::Above, 2500.0);
        assert!(above.is_triggered_by(2500.0));
        assert!(above.is_triggered_by(2600.0));
        assert!(!above.is_triggered_by(2499.99));

        let below = alert(2, "ETH", PriceSource::Spot, AlertDirection::Below, 1900.0);
        assert!(below.is_triggered_by(1900.0));
        assert!(below.is_triggered_by(1895.0));
        assert!(!below.is_triggered_by(1900.01));
    }

    #[test]
    fn test_alert_serializes_camel_case() {
        let a = alert(1_700_000_000_000, "BTC", PriceSource::Dex, AlertDirection::Below, 30_000.0);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["id"], 1_700_000_000_000_u64);
        assert_eq!(json["symbol"], "BTC");
        assert_eq!(json["targetPrice"], 30_000.0);
        assert_eq!(json["direction"], "below");
        assert_eq!(json["source"], "dex");
        assert!(json.get("referencePriceAtCreation").is_some());

        let back: Alert = serde_json::from_value(json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("Above".parse::<AlertDirection>().unwrap(), AlertDirection::Above);
        assert_eq!("down".parse::<AlertDirection>().unwrap(), AlertDirection::Below);
        assert!("sideways".parse::<AlertDirection>().is_err());
    }
}
