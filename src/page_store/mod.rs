//! Durable key-value storage for JSON blobs.
//!
//! Keys are relative, slash separated paths such as
//! `collections/alice-page-1.json`. The sync engine only relies on the
//! [`PageStore`] trait; [`FileJsonStore`] persists to disk and
//! [`InMemoryPageStore`] backs tests.

mod file_store;
mod memory_store;

pub use file_store::FileJsonStore;
pub use memory_store::InMemoryPageStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur while reading or writing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Trait for JSON blob storage backends.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Read the value stored at `key`, or `None` if nothing is stored there.
    async fn read(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write `value` at `key`, replacing any previous value.
    async fn write(&self, key: &str, value: &Value) -> Result<(), StoreError>;

    /// Like [`PageStore::write`], but keeps the previous value at `<key>.bak`.
    async fn write_with_backup(&self, key: &str, value: &Value) -> Result<(), StoreError>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// List the names of the entries directly under the `prefix` directory.
    async fn list_files(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Read and deserialize the value at `key`.
///
/// A value that fails to deserialize is logged and reported as missing, so
/// that a corrupted file behaves like a cache miss instead of an error.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn PageStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(value) = store.read(key).await? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            warn!("Ignoring malformed JSON at {}: {}", key, e);
            Ok(None)
        }
    }
}

pub async fn write_json<T: Serialize>(
    store: &dyn PageStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value)?;
    store.write(key, &value).await
}

pub async fn write_json_with_backup<T: Serialize>(
    store: &dyn PageStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value)?;
    store.write_with_backup(key, &value).await
}

/// Reject keys that could escape the store root.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.starts_with('/') || key.contains('\\') {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

pub(crate) fn backup_key(key: &str) -> String {
    format!("{}.bak", key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("collections/alice-page-1.json").is_ok());
        assert!(validate_key("progress.json").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("collections/../secret").is_err());
        assert!(validate_key("collections//x").is_err());
        assert!(validate_key("a\\b").is_err());
    }

    #[tokio::test]
    async fn test_read_json_treats_malformed_value_as_missing() {
        let store = InMemoryPageStore::new();
        store
            .write("collections/broken.json", &json!({"unexpected": true}))
            .await
            .unwrap();

        let parsed: Option<Sample> = read_json(&store, "collections/broken.json").await.unwrap();
        assert!(parsed.is_none());
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let store = InMemoryPageStore::new();
        let sample = Sample {
            name: "alice".to_string(),
            count: 3,
        };
        write_json(&store, "collections/sample.json", &sample)
            .await
            .unwrap();

        let parsed: Option<Sample> = read_json(&store, "collections/sample.json").await.unwrap();
        assert_eq!(parsed, Some(sample));
    }
}
