//! Notification sinks

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::alert::{Notification, Notifier};
use crate::shared::errors::NotificationError;

/// Writes notifications to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        info!("🔔 {}: {}", notification.title, notification.body);
        Ok(())
    }
}

/// Forwards notifications to the surrounding UI over a channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(sender: mpsc::Sender<Notification>) -> Self {
        Self { sender }
    }

    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(sender), receiver)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.sender
            .send(notification.clone())
            .await
            .map_err(|_| NotificationError::ChannelClosed)
    }
}

/// Delivers through `primary` and falls back to `fallback` when it fails
pub struct FallbackNotifier {
    primary: Arc<dyn Notifier>,
    fallback: Arc<dyn Notifier>,
}

impl FallbackNotifier {
    pub fn new(primary: Arc<dyn Notifier>, fallback: Arc<dyn Notifier>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl Notifier for FallbackNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        match self.primary.notify(notification).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("⚠️ Notification sink unavailable ({}), falling back", e);
                self.fallback.notify(notification).await
            }
        }
    }
}
