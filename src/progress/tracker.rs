use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Finished jobs are kept this long before being pruned.
pub const DEFAULT_JOB_RETENTION: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Preload,
    Update,
    Check,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Preload => "preload",
            JobKind::Update => "update",
            JobKind::Check => "check",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

/// A tracked job as exposed to callers.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedJob {
    pub id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Process-lifetime ledger of long-running operations.
///
/// Jobs only ever exist in memory. Completed and failed jobs are pruned once
/// they have been finished for longer than the retention; running jobs are
/// never pruned.
pub struct JobTracker {
    jobs: RwLock<HashMap<String, TrackedJob>>,
    retention: ChronoDuration,
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new(DEFAULT_JOB_RETENTION)
    }
}

impl JobTracker {
    pub fn new(retention: Duration) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            retention: ChronoDuration::from_std(retention).unwrap_or(ChronoDuration::MAX),
        }
    }

    /// Register a new running job and return its id.
    pub async fn start_job(&self, kind: JobKind, message: impl Into<String>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let job = TrackedJob {
            id: id.clone(),
            kind,
            status: JobStatus::Running,
            message: message.into(),
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        };
        debug!("Started {} job {}: {}", kind.as_str(), id, job.message);

        let mut jobs = self.jobs.write().await;
        Self::prune(&mut jobs, self.retention, Utc::now());
        jobs.insert(id.clone(), job);
        id
    }

    /// Mark a job as completed, optionally replacing its message.
    pub async fn complete_job(&self, id: &str, message: Option<String>) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(id) {
            job.status = JobStatus::Completed;
            job.finished_at = Some(Utc::now());
            if let Some(message) = message {
                job.message = message;
            }
        }
    }

    pub async fn fail_job(&self, id: &str, error: impl Into<String>) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(id) {
            job.status = JobStatus::Failed;
            job.finished_at = Some(Utc::now());
            job.error = Some(error.into());
        }
    }

    pub async fn get_job(&self, id: &str) -> Option<TrackedJob> {
        let mut jobs = self.jobs.write().await;
        Self::prune(&mut jobs, self.retention, Utc::now());
        jobs.get(id).cloned()
    }

    /// All retained jobs, most recently started first.
    pub async fn list_jobs(&self) -> Vec<TrackedJob> {
        let mut jobs = self.jobs.write().await;
        Self::prune(&mut jobs, self.retention, Utc::now());
        let mut list: Vec<TrackedJob> = jobs.values().cloned().collect();
        list.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        list
    }

    fn prune(
        jobs: &mut HashMap<String, TrackedJob>,
        retention: ChronoDuration,
        now: DateTime<Utc>,
    ) {
        jobs.retain(|_, job| match job.finished_at {
            Some(finished_at) => now - finished_at <= retention,
            None => true,
        });
    }
}
