//! Trigger notifications

use async_trait::async_trait;
use std::time::Duration;

use super::{AlertDirection, AlertTrigger};
use crate::shared::errors::NotificationError;
use crate::shared::utils::format_usd;

/// Notification for one triggered alert, plus the transient in-app message
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub toast: String,
    pub dismiss_after: Duration,
}

impl Notification {
    pub fn for_trigger(trigger: &AlertTrigger, dismiss_after: Duration) -> Self {
        let movement = match trigger.direction {
            AlertDirection::Above => "rose above",
            AlertDirection::Below => "fell below",
        };
        let title = format!("{} price alert", trigger.symbol);
        let body = format!(
            "{} on {} {} {} (now {})",
            trigger.symbol,
            trigger.source,
            movement,
            format_usd(trigger.target_price),
            format_usd(trigger.price)
        );
        let toast = format!("🔔 {}", body);

        Self {
            title,
            body,
            toast,
            dismiss_after,
        }
    }
}

/// Sink for trigger notifications. Delivery is best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alert::fixtures::alert;
    use crate::shared::types::PriceSource;

    #[test]
    fn test_notification_carries_trigger_details() {
        let a = alert(1, "ETH", PriceSource::Dex, AlertDirection::Below, 1900.0);
        let trigger = AlertTrigger::new(&a, 1895.0);
        let n = Notification::for_trigger(&trigger, Duration::from_secs(4));

        assert_eq!(n.title, "ETH price alert");
        assert_eq!(n.body, "ETH on Dex fell below $1,900.00 (now $1,895.00)");
        assert!(n.toast.contains(&n.body));
        assert_eq!(n.dismiss_after, Duration::from_secs(4));
    }
}
