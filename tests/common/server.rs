use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use discogs_collection_cache::config::SyncSettings;
use discogs_collection_cache::{
    make_app, CollectionService, DiscogsClient, FileJsonStore, JobTracker, PreloadLocks,
    RequestsLoggingLevel, ServerConfig, StaticCredentialProvider, SyncEngine,
};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

use super::discogs::{DiscogsMock, TOKEN};

pub struct TestServer {
    pub base_url: String,
    pub discogs: DiscogsMock,
    pub client: reqwest::Client,
    data_dir: TempDir,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let discogs = DiscogsMock::start().await;
        let data_dir = TempDir::new().expect("Failed to create temp dir");

        let credentials = Arc::new(StaticCredentialProvider::new(Some(TOKEN.to_string())));
        let client = DiscogsClient::new(&discogs.base_url(), "CollectionCacheTests/1.0", 5, credentials)
            .expect("Failed to create Discogs client");
        let settings = SyncSettings {
            request_delay: Duration::ZERO,
            ..SyncSettings::default()
        };
        let engine = Arc::new(SyncEngine::new(
            Arc::new(FileJsonStore::new(data_dir.path())),
            Arc::new(client),
            Arc::new(PreloadLocks::new()),
            settings,
        ));
        let service = CollectionService::new(engine, Arc::new(JobTracker::default()));

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port: 0,
        };
        let app = make_app(config, Arc::new(service));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            discogs,
            client: reqwest::Client::new(),
            data_dir,
        }
    }

    pub fn collections_dir(&self) -> PathBuf {
        self.data_dir.path().join("collections")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn post(&self, path: &str) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn get_json(&self, path: &str) -> Value {
        self.get(path).await.json().await.expect("Invalid JSON")
    }

    /// Poll a job until it leaves the running state.
    pub async fn wait_for_job(&self, job_id: &str) -> Value {
        for _ in 0..400 {
            let json = self.get_json(&format!("/v1/jobs/{}", job_id)).await;
            if json["data"]["status"] != "running" {
                return json["data"].clone();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Job {} did not finish", job_id);
    }
}
