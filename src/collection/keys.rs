//! Store key layout for cached collections.

use super::SyncError;

pub const COLLECTIONS_DIR: &str = "collections";

pub fn page_key(subject: &str, page: u32) -> String {
    format!("{}/{}", COLLECTIONS_DIR, page_file_name(subject, page))
}

pub fn progress_key(subject: &str) -> String {
    format!("{}/{}-progress.json", COLLECTIONS_DIR, subject)
}

pub fn page_file_name(subject: &str, page: u32) -> String {
    format!("{}-page-{}.json", subject, page)
}

/// Whether `file_name` is a cached page (`{subject}-page-{n}.json`) of `subject`.
pub fn is_page_file_of(subject: &str, file_name: &str) -> bool {
    file_name
        .strip_prefix(subject)
        .and_then(|rest| rest.strip_prefix("-page-"))
        .and_then(|rest| rest.strip_suffix(".json"))
        .is_some_and(|number| !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()))
}

/// Subjects become part of store keys, so only a conservative charset is allowed.
pub fn validate_subject(subject: &str) -> Result<(), SyncError> {
    let valid = !subject.is_empty()
        && subject.len() <= 128
        && subject != "."
        && subject != ".."
        && subject
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(SyncError::InvalidSubject(subject.to_string()))
    }
}
