use anyhow::{Context, Result};
use std::time::Duration;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use super::collection_routes::{make_collection_routes, make_job_routes};
use super::{log_requests, state::*, ServerConfig};
use crate::service::CollectionService;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: &'static str,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION"),
    };
    Json(stats)
}

pub fn make_app(config: ServerConfig, service: GuardedCollectionService) -> Router {
    let state = ServerState::new(config, service);

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    Router::new()
        .merge(home_router)
        .nest("/v1/collection", make_collection_routes(state.clone()))
        .nest("/v1/jobs", make_job_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(config: ServerConfig, service: CollectionService) -> Result<()> {
    let port = config.port;
    let app = make_app(config, std::sync::Arc::new(service));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
