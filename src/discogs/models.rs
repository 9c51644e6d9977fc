//! Wire models for the Discogs collection endpoint.
//!
//! Every optional field defaults so that sparse entries still decode.

use serde::{Deserialize, Serialize};

/// Pagination metadata as returned by the remote API and stored in cached pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub items: u32,
}

/// One page of raw collection entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCollectionPage {
    pub pagination: Pagination,
    #[serde(default)]
    pub releases: Vec<RawCollectionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCollectionEntry {
    pub id: u64,
    #[serde(default)]
    pub instance_id: Option<u64>,
    #[serde(default)]
    pub date_added: String,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub basic_information: RawBasicInformation,
    #[serde(default)]
    pub notes: Vec<RawNote>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBasicInformation {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub master_id: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub resource_url: Option<String>,
    #[serde(default)]
    pub artists: Vec<RawArtist>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
    #[serde(default)]
    pub labels: Vec<RawLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArtist {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFormat {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub qty: Option<String>,
    #[serde(default)]
    pub descriptions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLabel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub catno: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNote {
    #[serde(default)]
    pub field_id: Option<u32>,
    #[serde(default)]
    pub value: String,
}
