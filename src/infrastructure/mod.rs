//! Infrastructure layer - HTTP price clients, alert storage and notifiers

pub mod api_clients;
pub mod notifiers;
pub mod storage;

pub use api_clients::HttpPriceFeed;
pub use notifiers::{ChannelNotifier, FallbackNotifier, LogNotifier};
pub use storage::{JsonFileStorage, MemoryStorage};
