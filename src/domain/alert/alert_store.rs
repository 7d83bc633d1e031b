//! Authoritative set of active alerts

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{Alert, AlertId};
use crate::shared::errors::StorageError;
use crate::shared::utils::now_ms;

/// Largest id a millisecond timestamp can produce
const MAX_ALERT_ID: u64 = i64::MAX as u64;

/// Persistence port: read once at startup, rewritten on every mutation
#[async_trait]
pub trait AlertPersistence: Send + Sync {
    async fn load(&self) -> Result<Option<String>, StorageError>;
    async fn save(&self, blob: &str) -> Result<(), StorageError>;
}

/// In-memory alert set backed by a persistence port.
///
/// Readers get an immutable snapshot (`Arc<Vec<Alert>>`). Every mutation
/// builds a new vector from the current snapshot and swaps it in while
/// holding the write lock, so a manual removal and a trigger-driven removal
/// can never overwrite each other.
pub struct AlertStore {
    alerts: RwLock<Arc<Vec<Alert>>>,
    persistence: Arc<dyn AlertPersistence>,
    last_id: AtomicU64,
}

impl AlertStore {
    pub fn new(persistence: Arc<dyn AlertPersistence>) -> Self {
        Self {
            alerts: RwLock::new(Arc::new(Vec::new())),
            persistence,
            last_id: AtomicU64::new(0),
        }
    }

    /// Builds a store and loads whatever the port holds
    pub async fn open(persistence: Arc<dyn AlertPersistence>) -> Self {
        let store = Self::new(persistence);
        store.restore().await;
        store
    }

    /// Decode a persisted blob. Corrupt input yields an empty set; records
    /// that fail to decode, carry an unusable target or id, or repeat an id
    /// are skipped.
    pub fn restore_from_blob(blob: &str) -> Vec<Alert> {
        Self::decode_blob(blob).unwrap_or_else(|e| {
            warn!("⚠️ Persisted alerts are corrupt, starting empty: {}", e);
            Vec::new()
        })
    }

    fn decode_blob(blob: &str) -> Result<Vec<Alert>, serde_json::Error> {
        let records = serde_json::from_str::<Vec<Value>>(blob)?;

        let mut seen = HashSet::new();
        Ok(records
            .iter()
            .filter_map(|record| match Alert::deserialize(record) {
                Ok(alert) => Some(alert),
                Err(e) => {
                    warn!("⚠️ Skipping unreadable alert record: {}", e);
                    None
                }
            })
            .filter(|alert| alert.target_price.is_finite() && alert.target_price > 0.0)
            .filter(|alert| {
                // Ids are millisecond timestamps
                let plausible = alert.id.0 <= MAX_ALERT_ID;
                if !plausible {
                    warn!("⚠️ Skipping alert with out-of-range id {}", alert.id);
                }
                plausible
            })
            .filter(|alert| seen.insert(alert.id))
            .collect())
    }

    /// Current persisted set, `None` when nothing usable is stored
    async fn load_persisted(&self) -> Option<Vec<Alert>> {
        match self.persistence.load().await {
            Ok(Some(blob)) => match Self::decode_blob(&blob) {
                Ok(alerts) => Some(alerts),
                Err(e) => {
                    warn!("⚠️ Persisted alerts are corrupt: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("⚠️ Failed to read persisted alerts: {}", e);
                None
            }
        }
    }

    fn track_ids(&self, alerts: &[Alert]) {
        if let Some(max) = alerts.iter().map(|a| a.id.0).max() {
            self.last_id.fetch_max(max, Ordering::SeqCst);
        }
    }

    /// Replace the in-memory set with the persisted one. Never fails.
    pub async fn restore(&self) -> usize {
        let restored = self.load_persisted().await.unwrap_or_default();
        self.track_ids(&restored);

        let count = restored.len();
        *self.alerts.write().await = Arc::new(restored);
        info!("📂 Restored {} alert(s)", count);
        count
    }

    /// Pick up changes another writer made to the shared persistence.
    /// Keeps the in-memory set when nothing usable is stored.
    pub async fn refresh(&self) -> usize {
        let mut guard = self.alerts.write().await;
        if let Some(persisted) = self.load_persisted().await {
            self.track_ids(&persisted);
            if persisted != **guard {
                debug!("Alert set changed on disk, {} -> {}", guard.len(), persisted.len());
                *guard = Arc::new(persisted);
            }
        }
        guard.len()
    }

    /// Base for a mutation: the persisted set when readable, else the
    /// in-memory snapshot. Called with the write lock held.
    async fn current_locked(&self, snapshot: &Arc<Vec<Alert>>) -> Vec<Alert> {
        match self.load_persisted().await {
            Some(persisted) => {
                self.track_ids(&persisted);
                persisted
            }
            None => snapshot.as_ref().clone(),
        }
    }

    /// Strictly monotonic id, derived from the current time in milliseconds
    pub fn next_id(&self) -> AlertId {
        let now = now_ms();
        let mut last = self.last_id.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(last.saturating_add(1));
            match self
                .last_id
                .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return AlertId(candidate),
                Err(actual) => last = actual,
            }
        }
    }

    /// Current snapshot in creation order
    pub async fn list(&self) -> Arc<Vec<Alert>> {
        Arc::clone(&*self.alerts.read().await)
    }

    pub async fn get(&self, id: AlertId) -> Option<Alert> {
        self.alerts.read().await.iter().find(|a| a.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.alerts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.alerts.read().await.is_empty()
    }

    /// Returns `false` if an alert with the same id already exists
    pub async fn add(&self, alert: Alert) -> bool {
        let mut guard = self.alerts.write().await;
        let mut next = self.current_locked(&guard).await;
        if next.iter().any(|a| a.id == alert.id) {
            warn!("⚠️ Alert {} already exists, ignoring", alert.id);
            *guard = Arc::new(next);
            return false;
        }

        self.last_id.fetch_max(alert.id.0, Ordering::SeqCst);
        next.push(alert);
        *guard = Arc::new(next);
        self.persist(&guard).await;
        true
    }

    /// Removing an absent id is a no-op
    pub async fn remove(&self, id: AlertId) -> bool {
        !self.remove_many(&[id]).await.is_empty()
    }

    /// Returns the ids that were actually present
    pub async fn remove_many(&self, ids: &[AlertId]) -> Vec<AlertId> {
        if ids.is_empty() {
            return Vec::new();
        }

        let mut guard = self.alerts.write().await;
        let current = self.current_locked(&guard).await;
        let mut removed_ids = Vec::new();
        let mut next = Vec::with_capacity(current.len());
        for alert in current {
            if ids.contains(&alert.id) {
                removed_ids.push(alert.id);
            } else {
                next.push(alert);
            }
        }

        *guard = Arc::new(next);
        if removed_ids.is_empty() {
            debug!("No alerts matched removal of {:?}", ids);
            return Vec::new();
        }

        self.persist(&guard).await;
        removed_ids
    }

    async fn persist(&self, snapshot: &[Alert]) {
        let blob = match serde_json::to_string(snapshot) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("⚠️ Failed to serialize alerts: {}", e);
                return;
            }
        };
        if let Err(e) = self.persistence.save(&blob).await {
            warn!("⚠️ Failed to persist alerts: {}", e);
        }
    }
}
