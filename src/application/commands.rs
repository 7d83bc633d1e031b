//! CLI commands and handlers
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::alert_monitor::{AlertMonitor, AlertMonitorConfig};
use crate::application::services::{NewAlert, PriceService};
use crate::domain::alert::{AlertDirection, AlertId, AlertPersistence, AlertStore, Notification};
use crate::domain::price::PriceFeed;
use crate::infrastructure::{
    ChannelNotifier, FallbackNotifier, HttpPriceFeed, JsonFileStorage, LogNotifier, MemoryStorage,
};
use crate::shared::config::Config;
use crate::shared::errors::AppError;
use crate::shared::types::PriceSource;
use crate::shared::utils::{format_price, format_usd};

#[derive(Parser)]
#[command(name = "pricelens")]
#[command(version, about = "Crypto price comparison and threshold alerts")]
pub struct Cli {
    /// Path to config file (defaults to ./Config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep alerts in memory only for this run
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare spot, dex and best-price quotes for a symbol
    Compare { symbol: String },

    /// Show the price trend over a range of days (1, 7, 30, 90 or 365)
    History {
        symbol: String,

        #[arg(short, long, default_value_t = 7)]
        days: u32,
    },

    /// Manage price alerts
    #[command(subcommand)]
    Alert(AlertCommand),

    /// Run the alert monitor
    Monitor {
        /// Polling interval in seconds (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Stop after this many seconds; runs until Ctrl-C otherwise
        #[arg(short, long)]
        duration: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum AlertCommand {
    /// Create an alert against the live price of the chosen source
    Add {
        symbol: String,
        target: String,

        #[arg(long, default_value = "above")]
        direction: AlertDirection,

        #[arg(long, default_value = "spot")]
        source: PriceSource,
    },

    /// List active alerts
    List,

    /// Delete an alert by id
    Remove { id: AlertId },
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(cli: Cli, mut config: Config) -> Result<(), AppError> {
        let feed: Arc<dyn PriceFeed> = Arc::new(HttpPriceFeed::new(&config)?);
        let persistence: Arc<dyn AlertPersistence> = if cli.ephemeral {
            Arc::new(MemoryStorage::new())
        } else {
            Arc::new(JsonFileStorage::new(&config.storage.path, config.storage.key.clone()))
        };
        let store = Arc::new(AlertStore::open(persistence).await);
        let service = PriceService::new(Arc::clone(&feed), store);

        match cli.command {
            Commands::Compare { symbol } => Self::execute_compare_command(&service, &symbol).await,
            Commands::History { symbol, days } => Self::execute_history_command(&service, &symbol, days).await,
            Commands::Alert(command) => Self::execute_alert_command(&service, command).await,
            Commands::Monitor { interval, duration } => {
                if let Some(secs) = interval {
                    config.monitor.interval_secs = secs;
                    config.validate()?;
                }
                Self::execute_monitor_command(&service, feed, &config, duration).await
            }
        }
    }

    async fn execute_compare_command(service: &PriceService, symbol: &str) -> Result<(), AppError> {
        let cmp = service.compare(symbol).await?;

        info!("📊 {} prices:", cmp.symbol);
        for quote in cmp.quotes.iter() {
            let marker = if cmp.cheapest.contains(&quote.source) { "⭐" } else { "  " };
            match quote.fee {
                Some(fee) => info!("  {} {:<5} {}  (fee {})", marker, quote.source, format_price(quote.value), format_usd(fee)),
                None => info!("  {} {:<5} {}", marker, quote.source, format_price(quote.value)),
            }
        }
        info!("   Best: {}", format_price(cmp.best));
        Ok(())
    }

    async fn execute_history_command(service: &PriceService, symbol: &str, days: u32) -> Result<(), AppError> {
        let report = service.history(symbol, days).await?;
        if report.range.days() != days {
            info!("Using nearest supported range: {} day(s)", report.range.days());
        }

        let Some(summary) = report.summary else {
            warn!("⚠️ No history available for {}", report.symbol);
            return Ok(());
        };

        info!("📈 {} over {} day(s), {} samples:", report.symbol, summary.range.days(), summary.samples);
        info!("   First:  {}", format_usd(summary.first));
        info!("   Last:   {}", format_usd(summary.last));
        info!("   Low:    {}", format_usd(summary.min));
        info!("   High:   {}", format_usd(summary.max));
        info!("   Change: {:+.2}%", summary.change_percentage);
        Ok(())
    }

    async fn execute_alert_command(service: &PriceService, command: AlertCommand) -> Result<(), AppError> {
        match command {
            AlertCommand::Add {
                symbol,
                target,
                direction,
                source,
            } => {
                let alert = service
                    .create_alert(NewAlert {
                        symbol,
                        target,
                        direction,
                        source,
                    })
                    .await?;
                info!(
                    "Alert {}: {} on {} {} {} (now {})",
                    alert.id,
                    alert.symbol,
                    alert.source,
                    alert.direction,
                    format_usd(alert.target_price),
                    format_usd(alert.reference_price)
                );
            }
            AlertCommand::List => {
                let alerts = service.list_alerts().await;
                if alerts.is_empty() {
                    info!("No active alerts");
                }
                for alert in alerts {
                    info!(
                        "  {}  {:<6} {:<4} {:<5} {}  (created {})",
                        alert.id,
                        alert.symbol,
                        alert.source,
                        alert.direction,
                        format_usd(alert.target_price),
                        alert.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
            AlertCommand::Remove { id } => service.remove_alert(id).await?,
        }
        Ok(())
    }

    async fn execute_monitor_command(
        service: &PriceService,
        feed: Arc<dyn PriceFeed>,
        config: &Config,
        duration: Option<u64>,
    ) -> Result<(), AppError> {
        let store = Arc::clone(service.store());
        if store.is_empty().await {
            warn!("⚠️ No active alerts; the monitor will idle until alerts are added");
        }

        let (notifier, mut notifications) = ChannelNotifier::channel(32);
        let toasts = tokio::spawn(async move {
            while let Some(notification) = notifications.recv().await {
                show_toast(&notification);
            }
        });

        let monitor_config = AlertMonitorConfig::from(&config.monitor);
        info!("📊 Monitor configuration:");
        info!("   Interval: {:?}", monitor_config.interval);
        info!("   Fetch timeout: {:?}", monitor_config.fetch_timeout);
        info!("   Active alerts: {}", store.len().await);

        // Log delivery takes over if the toast task is gone
        let notifier = FallbackNotifier::new(Arc::new(notifier), Arc::new(LogNotifier));
        let monitor = Arc::new(AlertMonitor::new(monitor_config, store, feed, Arc::new(notifier)));
        let handle = Arc::clone(&monitor).spawn();

        match duration {
            Some(secs) => {
                info!("⏱️  Monitoring for {} seconds", secs);
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
                    _ = tokio::signal::ctrl_c() => info!("Interrupted"),
                }
            }
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("⚠️ Failed to listen for Ctrl-C: {}", e);
                }
            }
        }

        handle.stop().await;
        monitor.print_monitor_stats().await;

        // Dropping the last sender closes the toast channel
        drop(monitor);
        let _ = toasts.await;
        Ok(())
    }
}

fn show_toast(notification: &Notification) {
    info!("{}", notification.toast);
    info!("   (dismisses after {:?})", notification.dismiss_after);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_alert_add() {
        let cli = Cli::parse_from([
            "pricelens",
            "--ephemeral",
            "alert",
            "add",
            "eth",
            "1900",
            "--direction",
            "below",
            "--source",
            "dex",
        ]);
        assert!(cli.ephemeral);
        match cli.command {
            Commands::Alert(AlertCommand::Add {
                symbol,
                target,
                direction,
                source,
            }) => {
                assert_eq!(symbol, "eth");
                assert_eq!(target, "1900");
                assert_eq!(direction, AlertDirection::Below);
                assert_eq!(source, PriceSource::Dex);
            }
            _ => panic!("expected alert add"),
        }
    }

    #[test]
    fn test_parse_monitor_and_history_defaults() {
        let cli = Cli::parse_from(["pricelens", "monitor", "--duration", "60", "--config", "custom.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(
            cli.command,
            Commands::Monitor {
                interval: None,
                duration: Some(60)
            }
        ));

        let cli = Cli::parse_from(["pricelens", "history", "btc"]);
        assert!(matches!(cli.command, Commands::History { days: 7, .. }));
    }

    #[test]
    fn test_rejects_bad_direction_and_id() {
        assert!(Cli::try_parse_from(["pricelens", "alert", "add", "eth", "1", "--direction", "sideways"]).is_err());
        assert!(Cli::try_parse_from(["pricelens", "alert", "remove", "abc"]).is_err());
    }
}
