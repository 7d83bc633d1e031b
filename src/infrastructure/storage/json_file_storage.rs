//! Key-value JSON file, one blob per storage key

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};

use crate::domain::alert::AlertPersistence;
use crate::shared::errors::StorageError;

pub struct JsonFileStorage {
    path: PathBuf,
    key: String,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    async fn read_map(&self) -> Result<Option<Map<String, Value>>, StorageError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl AlertPersistence for JsonFileStorage {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        let Some(map) = self.read_map().await? else {
            debug!("No state file at {}", self.path.display());
            return Ok(None);
        };

        Ok(map.get(&self.key).map(|value| match value {
            Value::String(blob) => blob.clone(),
            other => other.to_string(),
        }))
    }

    async fn save(&self, blob: &str) -> Result<(), StorageError> {
        // Other keys in the file are preserved; an unreadable file is replaced
        let mut map = match self.read_map().await {
            Ok(map) => map.unwrap_or_default(),
            Err(e) => {
                warn!("⚠️ Replacing unreadable state file {}: {}", self.path.display(), e);
                Map::new()
            }
        };
        map.insert(self.key.clone(), Value::String(blob.to_string()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&map)?).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
