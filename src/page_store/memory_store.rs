//! In-memory JSON store.

use super::{backup_key, validate_key, PageStore, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Keeps every key in a map. Contents are lost when the store is dropped.
#[derive(Default)]
pub struct InMemoryPageStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl InMemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently stored, in lexicographic order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl PageStore for InMemoryPageStore {
    async fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        Ok(self.lock().get(key).cloned())
    }

    async fn write(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        validate_key(key)?;
        self.lock().insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn write_with_backup(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut entries = self.lock();
        if let Some(previous) = entries.get(key).cloned() {
            entries.insert(backup_key(key), previous);
        }
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.lock().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        Ok(self.lock().contains_key(key))
    }

    async fn list_files(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        validate_key(prefix)?;
        let dir = format!("{}/", prefix.trim_end_matches('/'));
        Ok(self
            .lock()
            .keys()
            .filter_map(|key| key.strip_prefix(&dir))
            .filter(|name| !name.contains('/'))
            .map(str::to_string)
            .collect())
    }
}
