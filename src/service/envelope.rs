use crate::collection::SyncError;
use serde::{Deserialize, Serialize};

/// Coarse classification of a failed envelope, used for transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    NotFound,
    Upstream,
    Internal,
}

impl From<&SyncError> for FailureKind {
    fn from(error: &SyncError) -> Self {
        match error {
            SyncError::InvalidSubject(_) => FailureKind::InvalidInput,
            SyncError::NoCachedData => FailureKind::NotFound,
            SyncError::Remote(_) | SyncError::PageFetch { .. } => FailureKind::Upstream,
            SyncError::Store(_) => FailureKind::Internal,
        }
    }
}

/// Uniform `{ success, data?, error? }` response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub failure: Option<FailureKind>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            failure: None,
        }
    }

    pub fn err(failure: FailureKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            failure: Some(failure),
        }
    }
}

impl<T> From<SyncError> for ApiEnvelope<T> {
    fn from(error: SyncError) -> Self {
        Self::err(FailureKind::from(&error), error.to_string())
    }
}

impl<T> From<Result<T, SyncError>> for ApiEnvelope<T> {
    fn from(result: Result<T, SyncError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => e.into(),
        }
    }
}
