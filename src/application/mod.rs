//! Application layer - use cases and services

pub mod alert_monitor;
pub mod commands;
pub mod services;

pub use alert_monitor::{AlertMonitor, AlertMonitorConfig, CycleReport, MonitorHandle};
pub use commands::{AlertCommand, Cli, CommandExecutor, Commands};
pub use services::{NewAlert, PriceComparison, PriceService};
