use crate::discogs::CatalogClientError;
use crate::page_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No cached data found")]
    NoCachedData,

    #[error("Invalid subject: {0:?}")]
    InvalidSubject(String),

    #[error("Remote catalog error: {0}")]
    Remote(#[from] CatalogClientError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to fetch page {page}: {message}")]
    PageFetch { page: u32, message: String },
}
