//! Collection and job API routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::state::{GuardedCollectionService, ServerState};
use crate::service::{ApiEnvelope, FailureKind};

const DEFAULT_SEARCH_PAGE_SIZE: u32 = 50;
const MAX_SEARCH_PAGE_SIZE: u32 = 500;

impl<T: Serialize> IntoResponse for ApiEnvelope<T> {
    fn into_response(self) -> Response {
        let status = match self.failure {
            None => StatusCode::OK,
            Some(FailureKind::InvalidInput) => StatusCode::BAD_REQUEST,
            Some(FailureKind::NotFound) => StatusCode::NOT_FOUND,
            Some(FailureKind::Upstream) => StatusCode::BAD_GATEWAY,
            Some(FailureKind::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Successful job submissions answer 202.
fn accepted<T: Serialize>(envelope: ApiEnvelope<T>) -> Response {
    if envelope.success {
        (StatusCode::ACCEPTED, Json(envelope)).into_response()
    } else {
        envelope.into_response()
    }
}

#[derive(Deserialize, Debug, Default)]
struct PageQuery {
    #[serde(default)]
    force: bool,
}

#[derive(Deserialize, Debug, Default)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    page: Option<u32>,
    per_page: Option<u32>,
}

async fn get_page(
    State(service): State<GuardedCollectionService>,
    Path((subject, page)): Path<(String, u32)>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    if page == 0 {
        return ApiEnvelope::<()>::err(FailureKind::InvalidInput, "Page numbers start at 1")
            .into_response();
    }
    service
        .get_page(&subject, page, query.force)
        .await
        .into_response()
}

async fn get_all(
    State(service): State<GuardedCollectionService>,
    Path(subject): Path<String>,
) -> impl IntoResponse {
    service.get_all(&subject).await
}

async fn search(
    State(service): State<GuardedCollectionService>,
    Path(subject): Path<String>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_SEARCH_PAGE_SIZE)
        .clamp(1, MAX_SEARCH_PAGE_SIZE);
    service
        .search_paginated(&subject, &query.q, page, per_page)
        .await
}

async fn preload(
    State(service): State<GuardedCollectionService>,
    Path(subject): Path<String>,
) -> impl IntoResponse {
    accepted(service.preload(&subject).await)
}

async fn get_progress(
    State(service): State<GuardedCollectionService>,
    Path(subject): Path<String>,
) -> impl IntoResponse {
    service.get_progress(&subject).await
}

async fn get_new_items(
    State(service): State<GuardedCollectionService>,
    Path(subject): Path<String>,
) -> impl IntoResponse {
    service.check_for_new_items(&subject).await
}

async fn update(
    State(service): State<GuardedCollectionService>,
    Path(subject): Path<String>,
) -> impl IntoResponse {
    accepted(service.update_with_new_items(&subject).await)
}

async fn clear_cache(
    State(service): State<GuardedCollectionService>,
    Path(subject): Path<String>,
) -> impl IntoResponse {
    service.clear_cache(&subject).await
}

async fn list_jobs(State(service): State<GuardedCollectionService>) -> impl IntoResponse {
    ApiEnvelope::ok(service.list_jobs().await)
}

async fn get_job(
    State(service): State<GuardedCollectionService>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match service.get_job(&id).await {
        Some(job) => ApiEnvelope::ok(job).into_response(),
        None => ApiEnvelope::<()>::err(FailureKind::NotFound, format!("Job {} not found", id))
            .into_response(),
    }
}

pub fn make_collection_routes(state: ServerState) -> Router {
    Router::new()
        .route("/{subject}/page/{page}", get(get_page))
        .route("/{subject}/all", get(get_all))
        .route("/{subject}/search", get(search))
        .route("/{subject}/preload", post(preload))
        .route("/{subject}/progress", get(get_progress))
        .route("/{subject}/new-items", get(get_new_items))
        .route("/{subject}/update", post(update))
        .route("/{subject}/cache", delete(clear_cache))
        .with_state(state)
}

pub fn make_job_routes(state: ServerState) -> Router {
    Router::new()
        .route("/", get(list_jobs))
        .route("/{id}", get(get_job))
        .with_state(state)
}
