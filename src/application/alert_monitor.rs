//! Periodic alert monitoring

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::domain::alert::{Alert, AlertId, AlertStore, AlertTrigger, Notification, Notifier};
use crate::domain::price::PriceFeed;
use crate::shared::config::MonitorCfg;
use crate::shared::types::{PriceSource, Symbol};
use crate::shared::utils::format_usd;

/// Alert monitor settings
#[derive(Debug, Clone)]
pub struct AlertMonitorConfig {
    pub interval: Duration,
    pub fetch_timeout: Duration,
    pub toast_duration: Duration,
}

impl Default for AlertMonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(15),
            toast_duration: Duration::from_secs(4),
        }
    }
}

impl From<&MonitorCfg> for AlertMonitorConfig {
    fn from(cfg: &MonitorCfg) -> Self {
        Self {
            interval: cfg.interval(),
            fetch_timeout: cfg.fetch_timeout(),
            toast_duration: cfg.toast_duration(),
        }
    }
}

/// Alerts of one polling pass grouped by (symbol, source)
#[derive(Debug, Default)]
pub struct MonitoringCycle {
    groups: BTreeMap<(Symbol, PriceSource), Vec<Alert>>,
}

impl MonitoringCycle {
    pub fn from_snapshot(alerts: &[Alert]) -> Self {
        let mut groups: BTreeMap<(Symbol, PriceSource), Vec<Alert>> = BTreeMap::new();
        for alert in alerts {
            groups
                .entry((alert.symbol.clone(), alert.source))
                .or_default()
                .push(alert.clone());
        }
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn into_groups(self) -> BTreeMap<(Symbol, PriceSource), Vec<Alert>> {
        self.groups
    }
}

/// Alerts of one group whose threshold `price` crosses
pub fn evaluate_group(alerts: &[Alert], price: f64) -> Vec<AlertTrigger> {
    if !price.is_finite() {
        return Vec::new();
    }
    alerts
        .iter()
        .filter(|alert| alert.is_triggered_by(price))
        .map(|alert| AlertTrigger::new(alert, price))
        .collect()
}

/// Outcome of one polling pass
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub groups: usize,
    pub fetches: usize,
    pub skipped_groups: usize,
    pub triggers: Vec<AlertTrigger>,
}

/// Monitor statistics
#[derive(Debug, Clone)]
pub struct MonitorStats {
    pub start_time: Instant,
    pub cycles_run: u64,
    pub fetches: u64,
    pub skipped_groups: u64,
    pub triggers_fired: u64,
    pub last_update: Instant,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            cycles_run: 0,
            fetches: 0,
            skipped_groups: 0,
            triggers_fired: 0,
            last_update: Instant::now(),
        }
    }

    pub fn record(&mut self, report: &CycleReport) {
        self.cycles_run += 1;
        self.fetches += report.fetches as u64;
        self.skipped_groups += report.skipped_groups as u64;
        self.triggers_fired += report.triggers.len() as u64;
        self.last_update = Instant::now();
    }

    pub fn get_uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for MonitorStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Polls prices for active alerts, fires notifications and removes
/// triggered alerts exactly once.
pub struct AlertMonitor {
    config: AlertMonitorConfig,
    store: Arc<AlertStore>,
    feed: Arc<dyn PriceFeed>,
    notifier: Arc<dyn Notifier>,
    stats: Arc<RwLock<MonitorStats>>,
}

impl AlertMonitor {
    pub fn new(
        config: AlertMonitorConfig,
        store: Arc<AlertStore>,
        feed: Arc<dyn PriceFeed>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            store,
            feed,
            notifier,
            stats: Arc::new(RwLock::new(MonitorStats::new())),
        }
    }

    /// One polling pass over a snapshot taken at cycle start, after
    /// picking up alerts other processes wrote to the shared state.
    ///
    /// Each (symbol, source) group gets exactly one fetch and fetches run
    /// concurrently. A group whose fetch fails, times out or yields no
    /// usable price is skipped until the next cycle. Triggered alerts are
    /// removed and notified once every fetch has settled.
    pub async fn run_cycle(&self) -> CycleReport {
        self.store.refresh().await;
        let snapshot = self.store.list().await;
        if snapshot.is_empty() {
            debug!("No active alerts, skipping cycle");
            return CycleReport::default();
        }

        let cycle = MonitoringCycle::from_snapshot(&snapshot);
        let mut report = CycleReport {
            groups: cycle.len(),
            fetches: cycle.len(),
            ..Default::default()
        };
        debug!("🔄 Checking {} alert(s) across {} group(s)", snapshot.len(), cycle.len());

        let fetch_timeout = self.config.fetch_timeout;
        let mut pending: FuturesUnordered<_> = cycle
            .into_groups()
            .into_iter()
            .map(|((symbol, source), alerts)| async move {
                let result = timeout(fetch_timeout, self.feed.fetch_quote(&symbol, source)).await;
                (symbol, source, alerts, result)
            })
            .collect();

        let mut triggered = Vec::new();
        while let Some((symbol, source, alerts, result)) = pending.next().await {
            let price = match result {
                Ok(Ok(quote)) => quote.value.filter(|p| p.is_finite()),
                Ok(Err(e)) => {
                    warn!("⚠️ {} {} fetch failed, retrying next cycle: {}", symbol, source, e);
                    None
                }
                Err(_) => {
                    warn!("⚠️ {} {} fetch timed out after {:?}", symbol, source, fetch_timeout);
                    None
                }
            };

            let Some(price) = price else {
                report.skipped_groups += 1;
                continue;
            };

            triggered.extend(evaluate_group(&alerts, price));
        }

        if !triggered.is_empty() {
            report.triggers = self.fire(triggered).await;
        }

        self.stats.write().await.record(&report);
        report
    }

    /// Removes first and only notifies for alerts this call actually
    /// removed, so an alert deleted concurrently is never reported.
    async fn fire(&self, triggers: Vec<AlertTrigger>) -> Vec<AlertTrigger> {
        let ids: Vec<AlertId> = triggers.iter().map(|t| t.alert_id).collect();
        let removed = self.store.remove_many(&ids).await;

        let fired: Vec<AlertTrigger> = triggers
            .into_iter()
            .filter(|t| removed.contains(&t.alert_id))
            .collect();

        for trigger in &fired {
            info!(
                "🎯 Alert {} triggered: {} {} {} {} at {}",
                trigger.alert_id,
                trigger.symbol,
                trigger.source,
                trigger.direction,
                format_usd(trigger.target_price),
                format_usd(trigger.price)
            );
            let notification = Notification::for_trigger(trigger, self.config.toast_duration);
            if let Err(e) = self.notifier.notify(&notification).await {
                error!("❌ Failed to deliver notification for alert {}: {}", trigger.alert_id, e);
            }
        }

        fired
    }

    pub async fn get_stats(&self) -> MonitorStats {
        self.stats.read().await.clone()
    }

    pub async fn print_monitor_stats(&self) {
        let stats = self.stats.read().await;
        info!("📊 Monitor statistics:");
        info!("   Uptime: {:.1} min", stats.get_uptime().as_secs_f64() / 60.0);
        info!("   Cycles: {}", stats.cycles_run);
        if stats.fetches > 0 {
            info!("   Fetches: {}", stats.fetches);
        }
        if stats.skipped_groups > 0 {
            info!("   Skipped groups: {}", stats.skipped_groups);
        }
        if stats.triggers_fired > 0 {
            info!("   Alerts triggered: {}", stats.triggers_fired);
        }
        info!("   Active alerts: {}", self.store.len().await);
    }

    /// Start the periodic task. The first cycle runs immediately.
    pub fn spawn(self: Arc<Self>) -> MonitorHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let monitor = self;

        let join = tokio::spawn(async move {
            info!("🚀 Alert monitor started, polling every {:?}", monitor.config.interval);
            let mut ticker = tokio::time::interval(monitor.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    // Fires on stop() and when the handle is dropped
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        let report = monitor.run_cycle().await;
                        if !report.triggers.is_empty() || report.skipped_groups > 0 {
                            debug!(
                                "Cycle done: {} group(s), {} skipped, {} triggered",
                                report.groups,
                                report.skipped_groups,
                                report.triggers.len()
                            );
                        }
                    }
                }
            }

            info!("🛑 Alert monitor stopped");
        });

        MonitorHandle {
            shutdown: shutdown_tx,
            join,
        }
    }
}

/// Handle to a running monitor. Dropping it cancels the periodic task; a
/// cycle already in flight is allowed to finish.
pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl MonitorHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            error!("❌ Alert monitor task failed: {}", e);
        }
    }

    pub fn is_running(&self) -> bool {
        !self.join.is_finished()
    }
}
