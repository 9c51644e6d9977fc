use axum::extract::FromRef;

use crate::service::CollectionService;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedCollectionService = Arc<CollectionService>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub service: GuardedCollectionService,
}

impl ServerState {
    pub fn new(config: ServerConfig, service: GuardedCollectionService) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            service,
        }
    }
}

impl FromRef<ServerState> for GuardedCollectionService {
    fn from_ref(input: &ServerState) -> Self {
        input.service.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
