//! Conversion of raw remote entries into cached collection items.

use super::models::{CollectionItem, Release};
use crate::discogs::models::{RawArtist, RawCollectionEntry};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashSet;

const UNKNOWN_ARTIST: &str = "Unknown Artist";

impl From<RawCollectionEntry> for CollectionItem {
    fn from(entry: RawCollectionEntry) -> Self {
        let info = entry.basic_information;

        let catalog_number = info
            .labels
            .iter()
            .filter_map(|label| label.catno.as_deref())
            .map(str::trim)
            .find(|catno| !catno.is_empty())
            .map(str::to_string);

        let notes = entry
            .notes
            .iter()
            .map(|note| note.value.trim())
            .find(|value| !value.is_empty())
            .map(str::to_string);

        let release = Release {
            id: if info.id != 0 { info.id } else { entry.id },
            master_id: info.master_id.filter(|id| *id != 0),
            title: info.title,
            artist: artist_display_name(&info.artists),
            year: info.year.filter(|year| *year != 0),
            formats: info.formats.into_iter().map(|f| f.name).collect(),
            labels: info.labels.into_iter().map(|l| l.name).collect(),
            catalog_number,
            cover_image: non_empty(info.cover_image).or_else(|| non_empty(info.thumb)),
            resource_url: non_empty(info.resource_url),
        };

        Self {
            id: entry.id,
            date_added: entry.date_added,
            rating: entry.rating.filter(|rating| *rating != 0),
            notes,
            release,
        }
    }
}

/// Joins artist names, dropping the numeric disambiguation suffix (`"Name (2)"`).
fn artist_display_name(artists: &[RawArtist]) -> String {
    let names: Vec<&str> = artists
        .iter()
        .map(|artist| strip_disambiguation(artist.name.trim()))
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        UNKNOWN_ARTIST.to_string()
    } else {
        names.join(", ")
    }
}

fn strip_disambiguation(name: &str) -> &str {
    let Some(stripped) = name.strip_suffix(')') else {
        return name;
    };
    match stripped.rfind(" (") {
        Some(open) => {
            let number = &stripped[open + 2..];
            if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) {
                &name[..open]
            } else {
                name
            }
        }
        None => name,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Milliseconds since the epoch for a remote `date_added` value.
pub fn added_at_millis(date_added: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(date_added)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

pub fn millis_to_rfc3339(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Keeps the first occurrence of each item id, preserving order.
pub fn dedupe_by_id(items: impl IntoIterator<Item = CollectionItem>) -> Vec<CollectionItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id))
        .collect()
}
