//! Shared fakes for engine, service and route tests.

use crate::collection::SyncEngine;
use crate::config::SyncSettings;
use crate::discogs::models::{RawArtist, RawBasicInformation};
use crate::discogs::{
    AuthMode, CatalogClientError, CollectionSource, PageRequest, Pagination, RawCollectionEntry,
    RawCollectionPage,
};
use crate::page_store::InMemoryPageStore;
use async_trait::async_trait;
use chrono::{SecondsFormat, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::PreloadLocks;

/// In-memory remote collection. Each inner vector is one page at the
/// configured page size; requests with a smaller `per_page` get the first
/// entries of the requested page.
#[derive(Default)]
pub struct MockCollectionSource {
    pages: Mutex<Vec<Vec<RawCollectionEntry>>>,
    requests: Mutex<Vec<PageRequest>>,
    failing_pages: Mutex<HashSet<u32>>,
    fail_authenticated: Mutex<bool>,
}

impl MockCollectionSource {
    pub fn new(pages: Vec<Vec<RawCollectionEntry>>) -> Self {
        Self {
            pages: Mutex::new(pages),
            ..Default::default()
        }
    }

    pub fn set_pages(&self, pages: Vec<Vec<RawCollectionEntry>>) {
        *self.pages.lock().unwrap() = pages;
    }

    pub fn fail_page(&self, page: u32) {
        self.failing_pages.lock().unwrap().insert(page);
    }

    pub fn fail_authenticated_requests(&self) {
        *self.fail_authenticated.lock().unwrap() = true;
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requests().iter().map(|r| r.page).collect()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl CollectionSource for MockCollectionSource {
    async fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> Result<RawCollectionPage, CatalogClientError> {
        self.requests.lock().unwrap().push(request.clone());
        // Let concurrently started operations interleave.
        tokio::task::yield_now().await;

        if self.failing_pages.lock().unwrap().contains(&request.page) {
            return Err(CatalogClientError::Http {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        if request.auth == AuthMode::Authenticated && *self.fail_authenticated.lock().unwrap() {
            return Err(CatalogClientError::Http {
                status: 401,
                message: "Unauthorized".to_string(),
            });
        }

        let pages = self.pages.lock().unwrap();
        let total_items: usize = pages.iter().map(Vec::len).sum();
        let releases: Vec<RawCollectionEntry> = pages
            .get(request.page as usize - 1)
            .map(|entries| {
                entries
                    .iter()
                    .take(request.per_page as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(RawCollectionPage {
            pagination: Pagination {
                page: request.page,
                pages: pages.len() as u32,
                per_page: request.per_page,
                items: total_items as u32,
            },
            releases,
        })
    }
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn iso(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .unwrap()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn raw_entry(id: u64, added_ms: i64, title: &str, artist: &str) -> RawCollectionEntry {
    RawCollectionEntry {
        id,
        instance_id: Some(id * 10),
        date_added: iso(added_ms),
        rating: None,
        basic_information: RawBasicInformation {
            id: id + 100_000,
            title: title.to_string(),
            artists: vec![RawArtist {
                name: artist.to_string(),
                id: Some(1),
            }],
            ..Default::default()
        },
        notes: vec![],
    }
}

/// `count` entries with consecutive ids starting at `first_id`, newest first,
/// spaced one second apart and ending at `oldest_ms`.
pub fn raw_entries(first_id: u64, count: u64, oldest_ms: i64) -> Vec<RawCollectionEntry> {
    (0..count)
        .map(|i| {
            let added = oldest_ms + ((count - 1 - i) as i64) * 1_000;
            raw_entry(first_id + i, added, &format!("Title {}", first_id + i), "Artist")
        })
        .collect()
}

pub fn fast_settings() -> SyncSettings {
    SyncSettings {
        request_delay: Duration::ZERO,
        ..SyncSettings::default()
    }
}

pub struct EngineFixture {
    pub engine: Arc<SyncEngine>,
    pub store: Arc<InMemoryPageStore>,
    pub source: Arc<MockCollectionSource>,
    pub locks: Arc<PreloadLocks>,
}

pub fn engine_fixture(pages: Vec<Vec<RawCollectionEntry>>) -> EngineFixture {
    engine_fixture_with(pages, fast_settings())
}

pub fn engine_fixture_with(
    pages: Vec<Vec<RawCollectionEntry>>,
    settings: SyncSettings,
) -> EngineFixture {
    let store = Arc::new(InMemoryPageStore::new());
    let source = Arc::new(MockCollectionSource::new(pages));
    let locks = Arc::new(PreloadLocks::new());
    let engine = Arc::new(SyncEngine::new(
        store.clone(),
        source.clone(),
        locks.clone(),
        settings,
    ));
    EngineFixture {
        engine,
        store,
        source,
        locks,
    }
}
