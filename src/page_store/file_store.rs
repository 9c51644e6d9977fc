//! Filesystem-backed JSON store.

use super::{backup_key, validate_key, PageStore, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Stores each key as a pretty-printed JSON file below a root directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never observes a half-written file.
pub struct FileJsonStore {
    root: PathBuf,
}

impl FileJsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    async fn write_atomic(path: &Path, value: &Value) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // One temp file per write; concurrent writers of a key must not share it.
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        let tmp_path = PathBuf::from(tmp_name);

        let content = serde_json::to_vec_pretty(value)?;
        fs::write(&tmp_path, content).await?;
        if let Err(e) = fs::rename(&tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl PageStore for FileJsonStore {
    async fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key)?;
        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Failed to parse {:?}, treating as missing: {}", path, e);
                Ok(None)
            }
        }
    }

    async fn write(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        Self::write_atomic(&path, value).await
    }

    async fn write_with_backup(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let backup_path = self.path_for(&backup_key(key))?;

        match fs::copy(&path, &backup_path).await {
            Ok(_) => debug!("Backed up {:?} to {:?}", path, backup_path),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Self::write_atomic(&path, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn list_files(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.path_for(prefix)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
