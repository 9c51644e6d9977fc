//! Discogs Collection Cache Library
//!
//! Cache-first access to Discogs user collections, exposed over HTTP by the
//! `collection-cache-server` binary. Modules are public for testing and reuse.

pub mod collection;
pub mod config;
pub mod discogs;
pub mod page_store;
pub mod progress;
pub mod server;
pub mod service;

// Re-export commonly used types for convenience
pub use collection::{PreloadLocks, SyncEngine, SyncError};
pub use discogs::{CollectionSource, DiscogsClient, StaticCredentialProvider};
pub use page_store::{FileJsonStore, InMemoryPageStore, PageStore};
pub use progress::JobTracker;
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use service::{ApiEnvelope, CollectionService};
