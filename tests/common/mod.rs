//! Common test infrastructure
//!
//! Spawns the real HTTP app on a random port, backed by a [`FileJsonStore`]
//! in a temporary directory and a [`DiscogsClient`] pointed at an httpmock
//! server standing in for the Discogs API.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::TestServer;
//!
//! #[tokio::test]
//! async fn test_get_page() {
//!     let server = TestServer::spawn().await;
//!     let response = server.get("/v1/collection/alice/page/1").await;
//!     assert_eq!(response.status(), reqwest::StatusCode::OK);
//! }
//! ```

mod discogs;
mod server;

pub use discogs::{collection_body, release_json, DiscogsMock, SUBJECT};
pub use server::TestServer;
