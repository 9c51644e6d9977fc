//! Incremental detection and merge of items added remotely since the last cache write.
//!
//! The cutoff is the timestamp of cached page 1, which is the start time of
//! the fetch that produced it. Remote pages are scanned newest-first and the
//! scan stops at the first entry added at or before the cutoff.

use super::engine::{now_millis, SyncEngine};
use super::keys::{page_key, validate_subject};
use super::models::{CollectionItem, CollectionPage};
use super::transform::{added_at_millis, dedupe_by_id, millis_to_rfc3339};
use super::SyncError;
use crate::discogs::{PageRequest, Pagination, RawCollectionEntry};
use crate::page_store::write_json_with_backup;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItemsReport {
    pub new_items_count: usize,
    pub latest_cache_date: Option<String>,
    pub latest_discogs_date: Option<String>,
    pub pages_scanned: u32,
    /// The remote returned entries out of `date_added` order during the scan.
    pub ordering_violated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReport {
    pub new_items_added: usize,
    pub total_items: usize,
    pub total_pages: u32,
    pub orphan_pages_removed: u32,
}

#[derive(Debug, Default)]
struct ScanResult {
    entries: Vec<RawCollectionEntry>,
    pages_scanned: u32,
    ordering_violated: bool,
}

impl SyncEngine {
    /// Count remote items added after the cache was written, without changing the cache.
    pub async fn check_for_new_items(&self, subject: &str) -> Result<NewItemsReport, SyncError> {
        validate_subject(subject)?;
        let cutoff = self.cache_cutoff(subject).await?;
        let latest_cache_date = millis_to_rfc3339(cutoff);

        let probe = self
            .request_with_fallback(PageRequest::newest_first(subject, 1, 1))
            .await?;
        let latest_discogs_date = probe.releases.first().map(|e| e.date_added.clone());
        let latest_remote = probe
            .releases
            .first()
            .and_then(|e| added_at_millis(&e.date_added));

        if latest_remote.map_or(true, |latest| latest <= cutoff) {
            debug!("No new items for {}", subject);
            return Ok(NewItemsReport {
                new_items_count: 0,
                latest_cache_date,
                latest_discogs_date,
                pages_scanned: 0,
                ordering_violated: false,
            });
        }

        let scan = self.scan_new_entries(subject, cutoff).await?;
        info!(
            "Found {} new items for {} across {} pages",
            scan.entries.len(),
            subject,
            scan.pages_scanned
        );
        Ok(NewItemsReport {
            new_items_count: scan.entries.len(),
            latest_cache_date,
            latest_discogs_date,
            pages_scanned: scan.pages_scanned,
            ordering_violated: scan.ordering_violated,
        })
    }

    /// Merge remotely added items into the cache and re-paginate it.
    ///
    /// New items go first, duplicates by id keep their first occurrence, and
    /// every rewritten page carries the time this update started. Pages past
    /// the new last page are deleted.
    pub async fn update_cache_with_new_items(
        &self,
        subject: &str,
    ) -> Result<UpdateReport, SyncError> {
        validate_subject(subject)?;
        let cutoff = self.cache_cutoff(subject).await?;
        let update_started = now_millis();

        let scan = self.scan_new_entries(subject, cutoff).await?;
        if scan.entries.is_empty() {
            let existing = self.load_cached_pages(subject).await?;
            let total_items = existing.iter().map(|p| p.data.len()).sum();
            return Ok(UpdateReport {
                new_items_added: 0,
                total_items,
                total_pages: existing.len() as u32,
                orphan_pages_removed: 0,
            });
        }

        let new_items: Vec<CollectionItem> = scan
            .entries
            .into_iter()
            .map(CollectionItem::from)
            .collect();
        let new_items_added = new_items.len();

        let existing = self.load_cached_pages(subject).await?;
        let merged = dedupe_by_id(
            new_items
                .into_iter()
                .chain(existing.into_iter().flat_map(|page| page.data)),
        );
        let total_items = merged.len();
        let pages = paginate(merged, self.settings.per_page, update_started);
        let total_pages = pages.len() as u32;

        for page in &pages {
            write_json_with_backup(
                self.store.as_ref(),
                &page_key(subject, page.pagination.page),
                page,
            )
            .await?;
        }

        let orphan_pages_removed = self.remove_orphan_pages(subject, total_pages).await?;

        info!(
            "Merged {} new items into {}: {} items over {} pages",
            new_items_added, subject, total_items, total_pages
        );
        Ok(UpdateReport {
            new_items_added,
            total_items,
            total_pages,
            orphan_pages_removed,
        })
    }

    async fn cache_cutoff(&self, subject: &str) -> Result<i64, SyncError> {
        self.read_cached_page(subject, 1)
            .await?
            .map(|page| page.timestamp)
            .ok_or(SyncError::NoCachedData)
    }

    async fn scan_new_entries(&self, subject: &str, cutoff: i64) -> Result<ScanResult, SyncError> {
        let mut result = ScanResult::default();
        let mut previous_added: Option<i64> = None;

        for page in 1..=self.settings.max_scan_pages {
            self.pace().await;
            let raw = self
                .request_with_fallback(PageRequest::newest_first(
                    subject,
                    page,
                    self.settings.per_page,
                ))
                .await?;
            result.pages_scanned += 1;

            let last_page = raw.pagination.pages;
            let is_empty = raw.releases.is_empty();
            let mut reached_cutoff = false;
            let mut new_on_page = 0;

            for entry in raw.releases {
                let added = added_at_millis(&entry.date_added);
                if let (Some(previous), Some(current)) = (previous_added, added) {
                    if current > previous && !result.ordering_violated {
                        warn!(
                            "Remote returned {} entries out of date order on page {}, scanning without early exit",
                            subject, page
                        );
                        result.ordering_violated = true;
                    }
                }
                if added.is_some() {
                    previous_added = added;
                }

                if added.is_some_and(|t| t > cutoff) {
                    result.entries.push(entry);
                    new_on_page += 1;
                } else {
                    reached_cutoff = true;
                    if !result.ordering_violated {
                        break;
                    }
                }
            }

            if reached_cutoff && !result.ordering_violated {
                break;
            }
            if result.ordering_violated && new_on_page == 0 {
                break;
            }
            if is_empty || page >= last_page {
                break;
            }
        }

        Ok(result)
    }

    /// Delete pages numbered past `last_page` until one is missing.
    async fn remove_orphan_pages(&self, subject: &str, last_page: u32) -> Result<u32, SyncError> {
        let mut removed = 0;
        for page in (last_page + 1)..=(last_page + self.settings.orphan_probe_pages) {
            let key = page_key(subject, page);
            if !self.store.exists(&key).await? {
                break;
            }
            self.store.delete(&key).await?;
            removed += 1;
        }
        if removed > 0 {
            debug!("Removed {} orphan pages of {}", removed, subject);
        }
        Ok(removed)
    }
}

/// Split `items` into consecutive pages of `per_page`.
fn paginate(items: Vec<CollectionItem>, per_page: u32, timestamp: i64) -> Vec<CollectionPage> {
    let per_page = per_page.max(1);
    let total_items = items.len() as u32;
    let total_pages = total_items.div_ceil(per_page).max(1);

    let mut pages = Vec::with_capacity(total_pages as usize);
    let mut remaining = items.into_iter();
    for page in 1..=total_pages {
        let data: Vec<CollectionItem> = remaining.by_ref().take(per_page as usize).collect();
        pages.push(CollectionPage::new(
            data,
            Pagination {
                page,
                pages: total_pages,
                per_page,
                items: total_items,
            },
            timestamp,
        ));
    }
    pages
}
