//! Cached collection data and sync bookkeeping records.

use crate::discogs::Pagination;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Release metadata embedded in each collection item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub id: u64,
    #[serde(default)]
    pub master_id: Option<u64>,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub formats: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub catalog_number: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub resource_url: Option<String>,
}

/// One owned entry of a subject's collection.
///
/// `date_added` orders entries but is not unique; `id` is unique within a
/// subject's full collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    pub id: u64,
    pub date_added: String,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
    pub release: Release,
}

/// A persisted unit of cache.
///
/// `timestamp` (milliseconds since the epoch) records when the fetch that
/// produced the page *started*, so that items added remotely while a fetch
/// was in flight are still newer than the cache on the next check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionPage {
    pub success: bool,
    pub data: Vec<CollectionItem>,
    pub pagination: Pagination,
    pub timestamp: i64,
}

impl CollectionPage {
    pub fn new(data: Vec<CollectionItem>, pagination: Pagination, timestamp: i64) -> Self {
        Self {
            success: true,
            data,
            pagination,
            timestamp,
        }
    }

    pub fn is_valid_at(&self, now_ms: i64, ttl: Duration) -> bool {
        is_cache_valid(now_ms, self.timestamp, ttl)
    }
}

/// Whether a page written at `timestamp_ms` is still fresh at `now_ms`.
pub fn is_cache_valid(now_ms: i64, timestamp_ms: i64, ttl: Duration) -> bool {
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_sub(timestamp_ms) < ttl_ms
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreloadStatus {
    Loading,
    Completed,
    Failed,
}

/// Advisory record of the last full preload of a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadProgress {
    pub subject: String,
    pub total_pages: u32,
    pub current_page: u32,
    pub completed_pages: Vec<u32>,
    #[serde(default)]
    pub failed_pages: Vec<u32>,
    pub start_time: i64,
    pub status: PreloadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PreloadProgress {
    pub fn started(subject: &str, total_pages: u32, start_time: i64) -> Self {
        Self {
            subject: subject.to_string(),
            total_pages,
            current_page: 1,
            completed_pages: Vec::new(),
            failed_pages: Vec::new(),
            start_time,
            status: PreloadStatus::Loading,
            end_time: None,
            error: None,
        }
    }

    pub fn record_success(&mut self, page: u32) {
        self.current_page = page;
        if !self.completed_pages.contains(&page) {
            self.completed_pages.push(page);
        }
    }

    pub fn record_failure(&mut self, page: u32) {
        self.current_page = page;
        if !self.failed_pages.contains(&page) {
            self.failed_pages.push(page);
        }
    }

    pub fn complete(&mut self, end_time: i64) {
        self.status = PreloadStatus::Completed;
        self.end_time = Some(end_time);
    }

    pub fn fail(&mut self, end_time: i64, error: impl Into<String>) {
        self.status = PreloadStatus::Failed;
        self.end_time = Some(end_time);
        self.error = Some(error.into());
    }

    /// A completed pass without failed pages that ended within `window`.
    pub fn is_warm(&self, now_ms: i64, window: Duration) -> bool {
        self.status == PreloadStatus::Completed
            && self.failed_pages.is_empty()
            && self
                .end_time
                .is_some_and(|end| is_cache_valid(now_ms, end, window))
    }
}
