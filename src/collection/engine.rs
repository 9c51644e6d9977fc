//! Cache-first access to a subject's collection pages.
//!
//! Every page is persisted under `collections/{subject}-page-{n}.json`
//! together with the time its fetch started. Full preloads are guarded per
//! subject by [`PreloadLocks`] and paced with a fixed delay before each
//! remote call.

use super::keys::{is_page_file_of, page_key, progress_key, validate_subject, COLLECTIONS_DIR};
use super::locks::PreloadLocks;
use super::models::{CollectionItem, CollectionPage, PreloadProgress};
use super::transform::dedupe_by_id;
use super::SyncError;
use crate::config::SyncSettings;
use crate::discogs::{CatalogClientError, CollectionSource, PageRequest, RawCollectionPage};
use crate::page_store::{read_json, write_json, PageStore};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Result of a [`SyncEngine::preload_all`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PreloadOutcome {
    /// Another preload of the same subject holds the lock.
    AlreadyRunning,
    /// A clean preload finished recently; nothing was fetched.
    StillWarm,
    Completed {
        total_pages: u32,
        failed_pages: Vec<u32>,
    },
    Failed {
        error: String,
    },
}

/// Every cached item of a subject, deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSnapshot {
    pub items: Vec<CollectionItem>,
    pub pages_loaded: u32,
    /// Page 1 is missing or older than the TTL.
    pub needs_refresh: bool,
}

pub struct SyncEngine {
    pub(super) store: Arc<dyn PageStore>,
    pub(super) source: Arc<dyn CollectionSource>,
    pub(super) locks: Arc<PreloadLocks>,
    pub(super) settings: SyncSettings,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn PageStore>,
        source: Arc<dyn CollectionSource>,
        locks: Arc<PreloadLocks>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            source,
            locks,
            settings,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn is_preloading(&self, subject: &str) -> bool {
        self.locks.is_locked(subject)
    }

    /// Return page `page` of `subject`, from cache when fresh.
    ///
    /// With `force_reload` the cache is bypassed. A successful remote fetch
    /// always overwrites the cached page.
    pub async fn fetch_page(
        &self,
        subject: &str,
        page: u32,
        per_page: u32,
        force_reload: bool,
    ) -> Result<CollectionPage, SyncError> {
        validate_subject(subject)?;
        self.fetch_page_unchecked(subject, page.max(1), per_page.max(1), force_reload, false)
            .await
    }

    /// [`SyncEngine::fetch_page`] with the configured page size.
    pub async fn get_page(&self, subject: &str, page: u32) -> Result<CollectionPage, SyncError> {
        self.fetch_page(subject, page, self.settings.per_page, false).await
    }

    /// Cached page regardless of its age, if any.
    pub async fn cached_page(
        &self,
        subject: &str,
        page: u32,
    ) -> Result<Option<CollectionPage>, SyncError> {
        validate_subject(subject)?;
        self.read_cached_page(subject, page).await
    }

    pub(super) async fn fetch_page_unchecked(
        &self,
        subject: &str,
        page: u32,
        per_page: u32,
        force_reload: bool,
        paced: bool,
    ) -> Result<CollectionPage, SyncError> {
        if !force_reload {
            if let Some(cached) = self.read_cached_page(subject, page).await? {
                if cached.is_valid_at(now_millis(), self.settings.cache_ttl) {
                    debug!("Serving {} page {} from cache", subject, page);
                    return Ok(cached);
                }
                debug!("Cached {} page {} is stale", subject, page);
            }
        }

        if paced {
            self.pace().await;
        }

        let fetch_started = now_millis();
        let raw = self
            .request_with_fallback(PageRequest::new(subject, page, per_page))
            .await?;
        let items = raw.releases.into_iter().map(CollectionItem::from).collect();
        let fetched = CollectionPage::new(items, raw.pagination, fetch_started);

        write_json(self.store.as_ref(), &page_key(subject, page), &fetched).await?;
        debug!(
            "Cached {} page {} ({} items)",
            subject,
            page,
            fetched.data.len()
        );
        Ok(fetched)
    }

    pub(super) async fn read_cached_page(
        &self,
        subject: &str,
        page: u32,
    ) -> Result<Option<CollectionPage>, SyncError> {
        Ok(read_json(self.store.as_ref(), &page_key(subject, page)).await?)
    }

    /// Cached pages `1..` in order, stopping at the first missing page.
    pub async fn load_cached_pages(&self, subject: &str) -> Result<Vec<CollectionPage>, SyncError> {
        validate_subject(subject)?;
        let mut pages = Vec::new();
        let mut page = 1;
        while let Some(cached) = self.read_cached_page(subject, page).await? {
            pages.push(cached);
            page += 1;
        }
        Ok(pages)
    }

    pub async fn get_all(&self, subject: &str) -> Result<CollectionSnapshot, SyncError> {
        let pages = self.load_cached_pages(subject).await?;
        let needs_refresh = pages
            .first()
            .map_or(true, |first| !first.is_valid_at(now_millis(), self.settings.cache_ttl));
        let pages_loaded = pages.len() as u32;
        let items = dedupe_by_id(pages.into_iter().flat_map(|page| page.data));
        Ok(CollectionSnapshot {
            items,
            pages_loaded,
            needs_refresh,
        })
    }

    pub async fn get_progress(&self, subject: &str) -> Result<Option<PreloadProgress>, SyncError> {
        validate_subject(subject)?;
        Ok(read_json(self.store.as_ref(), &progress_key(subject)).await?)
    }

    async fn save_progress(&self, progress: &PreloadProgress) -> Result<(), SyncError> {
        write_json(
            self.store.as_ref(),
            &progress_key(&progress.subject),
            progress,
        )
        .await?;
        Ok(())
    }

    /// Delete every cached page of `subject`. The progress record is kept.
    pub async fn clear_cache(&self, subject: &str) -> Result<usize, SyncError> {
        validate_subject(subject)?;
        let mut deleted = 0;
        for file_name in self.store.list_files(COLLECTIONS_DIR).await? {
            if is_page_file_of(subject, &file_name) {
                self.store
                    .delete(&format!("{}/{}", COLLECTIONS_DIR, file_name))
                    .await?;
                deleted += 1;
            }
        }
        info!("Cleared {} cached pages for {}", deleted, subject);
        Ok(deleted)
    }

    /// Fetch every page of `subject` into the cache.
    ///
    /// Only one preload per subject runs at a time; a concurrent call returns
    /// [`PreloadOutcome::AlreadyRunning`] without touching the remote. Pages
    /// that fail are recorded and skipped. The lock is released on every exit
    /// path.
    pub async fn preload_all(&self, subject: &str) -> PreloadOutcome {
        if let Err(e) = validate_subject(subject) {
            return PreloadOutcome::Failed {
                error: e.to_string(),
            };
        }

        let Some(_guard) = self.locks.try_acquire(subject) else {
            info!("Preload already in progress for {}", subject);
            return PreloadOutcome::AlreadyRunning;
        };

        match self.run_preload(subject).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Preload of {} failed: {}", subject, e);
                self.mark_preload_failed(subject, &e.to_string()).await;
                PreloadOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn run_preload(&self, subject: &str) -> Result<PreloadOutcome, SyncError> {
        if let Some(progress) = self.get_progress(subject).await? {
            if progress.is_warm(now_millis(), self.settings.preload_warm_window)
                && self.store.exists(&page_key(subject, 1)).await?
            {
                info!("Skipping preload of {}, last pass is still warm", subject);
                return Ok(PreloadOutcome::StillWarm);
            }
        }

        let per_page = self.settings.per_page;
        let start_time = now_millis();
        info!("Starting preload of {}", subject);

        let first = match self
            .fetch_page_unchecked(subject, 1, per_page, false, true)
            .await
        {
            Ok(first) => first,
            Err(e) => {
                warn!("Failed to fetch first page of {}: {}", subject, e);
                let error = SyncError::PageFetch {
                    page: 1,
                    message: e.to_string(),
                }
                .to_string();
                let mut progress = PreloadProgress::started(subject, 0, start_time);
                progress.record_failure(1);
                progress.fail(now_millis(), error.clone());
                self.save_progress(&progress).await?;
                return Ok(PreloadOutcome::Failed { error });
            }
        };

        let total_pages = first.pagination.pages.max(1);
        let mut progress = PreloadProgress::started(subject, total_pages, start_time);
        progress.record_success(1);
        self.save_progress(&progress).await?;

        for page in 2..=total_pages {
            match self
                .fetch_page_unchecked(subject, page, per_page, false, true)
                .await
            {
                Ok(_) => {
                    progress.record_success(page);
                    self.save_progress(&progress).await?;
                }
                Err(e) => {
                    warn!(
                        "Failed to preload page {}/{} of {}: {}",
                        page, total_pages, subject, e
                    );
                    progress.record_failure(page);
                }
            }
        }

        progress.complete(now_millis());
        self.save_progress(&progress).await?;

        info!(
            "Preload of {} finished: {} pages, {} failed",
            subject,
            total_pages,
            progress.failed_pages.len()
        );
        Ok(PreloadOutcome::Completed {
            total_pages,
            failed_pages: progress.failed_pages,
        })
    }

    async fn mark_preload_failed(&self, subject: &str, error: &str) {
        let progress = match self.get_progress(subject).await {
            Ok(Some(mut progress)) => {
                progress.fail(now_millis(), error);
                progress
            }
            _ => {
                let mut progress = PreloadProgress::started(subject, 0, now_millis());
                progress.fail(now_millis(), error);
                progress
            }
        };
        if let Err(e) = self.save_progress(&progress).await {
            warn!("Failed to persist failed preload of {}: {}", subject, e);
        }
    }

    /// Authenticated request, retried once anonymously on failure.
    ///
    /// If both fail the authenticated error is returned.
    pub(super) async fn request_with_fallback(
        &self,
        request: PageRequest,
    ) -> Result<RawCollectionPage, CatalogClientError> {
        match self.source.fetch_page(&request).await {
            Ok(page) => Ok(page),
            Err(e) => {
                warn!(
                    "Request for {} page {} failed ({}), retrying anonymously",
                    request.subject, request.page, e
                );
                match self.source.fetch_page(&request.clone().anonymous()).await {
                    Ok(page) => Ok(page),
                    Err(anonymous) => {
                        debug!("Anonymous retry also failed: {}", anonymous);
                        Err(e)
                    }
                }
            }
        }
    }

    pub(super) async fn pace(&self) {
        if !self.settings.request_delay.is_zero() {
            tokio::time::sleep(self.settings.request_delay).await;
        }
    }
}
