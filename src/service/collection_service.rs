//! Envelope-returning facade over [`SyncEngine`].
//!
//! Long operations (full preload and merge update) run as spawned tokio
//! tasks registered in the [`JobTracker`]; the caller gets the job id back
//! immediately. Reads that find a stale or empty cache schedule a preload in
//! the background and still answer from whatever is cached.

use super::ApiEnvelope;
use crate::collection::keys::validate_subject;
use crate::collection::{
    CollectionPage, CollectionSnapshot, NewItemsReport, PreloadOutcome, PreloadProgress,
    SearchResults, SyncEngine,
};
use crate::progress::{JobKind, JobTracker, TrackedJob};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAccepted {
    pub job_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheCleared {
    pub pages_deleted: usize,
}

#[derive(Clone)]
pub struct CollectionService {
    engine: Arc<SyncEngine>,
    jobs: Arc<JobTracker>,
}

impl CollectionService {
    pub fn new(engine: Arc<SyncEngine>, jobs: Arc<JobTracker>) -> Self {
        Self { engine, jobs }
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub async fn get_page(
        &self,
        subject: &str,
        page: u32,
        force_reload: bool,
    ) -> ApiEnvelope<CollectionPage> {
        let per_page = self.engine.settings().per_page;
        self.engine
            .fetch_page(subject, page, per_page, force_reload)
            .await
            .into()
    }

    pub async fn get_all(&self, subject: &str) -> ApiEnvelope<CollectionSnapshot> {
        let result = self.engine.get_all(subject).await;
        if let Ok(snapshot) = &result {
            if snapshot.needs_refresh {
                self.schedule_refresh(subject).await;
            }
        }
        result.into()
    }

    pub async fn search_paginated(
        &self,
        subject: &str,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> ApiEnvelope<SearchResults> {
        let result = self
            .engine
            .search_from_cache(subject, query, page, per_page)
            .await;
        if let Ok(results) = &result {
            if results.needs_refresh {
                self.schedule_refresh(subject).await;
            }
        }
        result.into()
    }

    /// Start a full preload in the background.
    pub async fn preload(&self, subject: &str) -> ApiEnvelope<JobAccepted> {
        if let Err(e) = validate_subject(subject) {
            return e.into();
        }
        let job_id = self.spawn_preload(subject).await;
        ApiEnvelope::ok(JobAccepted { job_id })
    }

    pub async fn get_progress(&self, subject: &str) -> ApiEnvelope<Option<PreloadProgress>> {
        self.engine.get_progress(subject).await.into()
    }

    pub async fn check_for_new_items(&self, subject: &str) -> ApiEnvelope<NewItemsReport> {
        let job_id = self
            .jobs
            .start_job(JobKind::Check, format!("Checking {} for new items", subject))
            .await;
        let result = self.engine.check_for_new_items(subject).await;
        match &result {
            Ok(report) => {
                self.jobs
                    .complete_job(
                        &job_id,
                        Some(format!("{} new items", report.new_items_count)),
                    )
                    .await
            }
            Err(e) => self.jobs.fail_job(&job_id, e.to_string()).await,
        }
        result.into()
    }

    /// Start a merge of new remote items into the cache in the background.
    pub async fn update_with_new_items(&self, subject: &str) -> ApiEnvelope<JobAccepted> {
        if let Err(e) = validate_subject(subject) {
            return e.into();
        }

        let job_id = self
            .jobs
            .start_job(JobKind::Update, format!("Updating {}", subject))
            .await;
        let engine = self.engine.clone();
        let jobs = self.jobs.clone();
        let subject = subject.to_string();
        let id = job_id.clone();
        tokio::spawn(async move {
            match engine.update_cache_with_new_items(&subject).await {
                Ok(report) => {
                    jobs.complete_job(
                        &id,
                        Some(format!(
                            "Added {} new items ({} items over {} pages)",
                            report.new_items_added, report.total_items, report.total_pages
                        )),
                    )
                    .await
                }
                Err(e) => {
                    error!("Update of {} failed: {}", subject, e);
                    jobs.fail_job(&id, e.to_string()).await;
                }
            }
        });

        ApiEnvelope::ok(JobAccepted { job_id })
    }

    pub async fn clear_cache(&self, subject: &str) -> ApiEnvelope<CacheCleared> {
        self.engine
            .clear_cache(subject)
            .await
            .map(|pages_deleted| CacheCleared { pages_deleted })
            .into()
    }

    pub async fn list_jobs(&self) -> Vec<TrackedJob> {
        self.jobs.list_jobs().await
    }

    pub async fn get_job(&self, id: &str) -> Option<TrackedJob> {
        self.jobs.get_job(id).await
    }

    async fn schedule_refresh(&self, subject: &str) {
        if self.engine.is_preloading(subject) {
            debug!("Refresh of {} already running", subject);
            return;
        }
        info!("Cache of {} is stale or empty, scheduling preload", subject);
        self.spawn_preload(subject).await;
    }

    async fn spawn_preload(&self, subject: &str) -> String {
        let job_id = self
            .jobs
            .start_job(JobKind::Preload, format!("Preloading {}", subject))
            .await;
        let engine = self.engine.clone();
        let jobs = self.jobs.clone();
        let subject = subject.to_string();
        let id = job_id.clone();
        tokio::spawn(async move {
            match engine.preload_all(&subject).await {
                PreloadOutcome::Failed { error } => {
                    error!("Preload of {} failed: {}", subject, error);
                    jobs.fail_job(&id, error).await;
                }
                outcome => jobs.complete_job(&id, Some(describe(&outcome))).await,
            }
        });
        job_id
    }
}

fn describe(outcome: &PreloadOutcome) -> String {
    match outcome {
        PreloadOutcome::AlreadyRunning => "Preload already in progress".to_string(),
        PreloadOutcome::StillWarm => "Cache is still warm".to_string(),
        PreloadOutcome::Completed {
            total_pages,
            failed_pages,
        } if failed_pages.is_empty() => format!("Preloaded {} pages", total_pages),
        PreloadOutcome::Completed {
            total_pages,
            failed_pages,
        } => format!(
            "Preloaded {} pages, {} failed: {:?}",
            total_pages,
            failed_pages.len(),
            failed_pages
        ),
        PreloadOutcome::Failed { error } => error.clone(),
    }
}
