//! Ephemeral progress tracking for long-running collection operations.

mod tracker;

pub use tracker::{JobKind, JobStatus, JobTracker, TrackedJob, DEFAULT_JOB_RETENTION};
