mod collection_service;
mod envelope;

pub use collection_service::{CacheCleared, CollectionService, JobAccepted};
pub use envelope::{ApiEnvelope, FailureKind};
