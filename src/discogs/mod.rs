//! Remote catalog access.
//!
//! Provides the [`CollectionSource`] abstraction over the Discogs collection
//! endpoint, the reqwest-backed [`DiscogsClient`], and bearer credential lookup.

mod client;
mod credentials;
pub mod models;

pub use client::{
    AuthMode, CatalogClientError, CollectionSource, DiscogsClient, PageRequest, SortField,
    SortOrder, DEFAULT_DISCOGS_API_BASE,
};
pub use credentials::{CredentialProvider, StaticCredentialProvider};
pub use models::{Pagination, RawCollectionEntry, RawCollectionPage};
