//! Cache-first synchronization of remote record collections.

mod engine;
mod error;
mod incremental;
pub mod keys;
mod locks;
pub mod models;
mod search;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{CollectionSnapshot, PreloadOutcome, SyncEngine};
pub use error::SyncError;
pub use incremental::{NewItemsReport, UpdateReport};
pub use locks::{PreloadGuard, PreloadLocks};
pub use models::{CollectionItem, CollectionPage, PreloadProgress, PreloadStatus, Release};
pub use search::SearchResults;
