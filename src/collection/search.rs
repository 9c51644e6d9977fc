use super::engine::SyncEngine;
use super::models::CollectionItem;
use super::SyncError;
use crate::discogs::Pagination;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub query: String,
    pub items: Vec<CollectionItem>,
    pub pagination: Pagination,
    /// Page 1 is missing or stale; results may lag behind the remote.
    pub needs_refresh: bool,
}

impl SyncEngine {
    /// Search every cached item of `subject` by title or artist.
    ///
    /// Matching is a case-insensitive substring test; an empty query matches
    /// everything. Stale pages are still searched.
    pub async fn search_from_cache(
        &self,
        subject: &str,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<SearchResults, SyncError> {
        let snapshot = self.get_all(subject).await?;
        let needle = query.trim().to_lowercase();

        let matches: Vec<CollectionItem> = snapshot
            .items
            .into_iter()
            .filter(|item| matches_query(item, &needle))
            .collect();

        let per_page = per_page.max(1);
        let page = page.max(1);
        let total = matches.len() as u32;
        let pages = total.div_ceil(per_page);
        let items = matches
            .into_iter()
            .skip((page as usize - 1).saturating_mul(per_page as usize))
            .take(per_page as usize)
            .collect();

        Ok(SearchResults {
            query: query.to_string(),
            items,
            pagination: Pagination {
                page,
                pages,
                per_page,
                items: total,
            },
            needs_refresh: snapshot.needs_refresh,
        })
    }
}

fn matches_query(item: &CollectionItem, needle: &str) -> bool {
    needle.is_empty()
        || item.release.title.to_lowercase().contains(needle)
        || item.release.artist.to_lowercase().contains(needle)
}
