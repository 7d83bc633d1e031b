use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::alert::AlertPersistence;
use crate::shared::errors::StorageError;

/// Process-local persistence, nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blob: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }

    pub fn blob(&self) -> Option<String> {
        self.blob.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl AlertPersistence for MemoryStorage {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.blob())
    }

    async fn save(&self, blob: &str) -> Result<(), StorageError> {
        if let Ok(mut guard) = self.blob.lock() {
            *guard = Some(blob.to_string());
        }
        Ok(())
    }
}
