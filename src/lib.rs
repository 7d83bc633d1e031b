//! Pricelens - multi-source crypto price comparison and threshold alerts
//! Built with Domain-Driven Design principles

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use application::{AlertMonitor, PriceService};
pub use domain::alert::{Alert, AlertStore, AlertValidator};
pub use domain::price::{BestPriceSelector, PriceFeed, PriceNormalizer};
