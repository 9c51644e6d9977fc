//! HTTP client for the Discogs collection API.

use super::credentials::CredentialProvider;
use super::models::RawCollectionPage;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_DISCOGS_API_BASE: &str = "https://api.discogs.com";

/// Errors returned by a [`CollectionSource`].
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("No credential available for {0}")]
    MissingCredential(String),

    #[error("Remote catalog returned status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Added,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Added => "added",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Desc => "desc",
        }
    }
}

/// Whether a request carries the subject's bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Authenticated,
    Anonymous,
}

/// Parameters for one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub subject: String,
    pub page: u32,
    pub per_page: u32,
    pub sort: Option<SortField>,
    pub sort_order: Option<SortOrder>,
    pub auth: AuthMode,
}

impl PageRequest {
    /// Authenticated request in the remote's default order.
    pub fn new(subject: &str, page: u32, per_page: u32) -> Self {
        Self {
            subject: subject.to_string(),
            page,
            per_page,
            sort: None,
            sort_order: None,
            auth: AuthMode::Authenticated,
        }
    }

    /// Authenticated request sorted newest-added first.
    pub fn newest_first(subject: &str, page: u32, per_page: u32) -> Self {
        Self {
            sort: Some(SortField::Added),
            sort_order: Some(SortOrder::Desc),
            ..Self::new(subject, page, per_page)
        }
    }

    pub fn anonymous(mut self) -> Self {
        self.auth = AuthMode::Anonymous;
        self
    }
}

/// Source of remote collection pages.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest)
        -> Result<RawCollectionPage, CatalogClientError>;
}

/// Client for the Discogs `users/{username}/collection` endpoint.
pub struct DiscogsClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl DiscogsClient {
    /// Create a new Discogs client.
    ///
    /// # Arguments
    /// * `base_url` - API base URL (e.g., "https://api.discogs.com")
    /// * `user_agent` - User-Agent header, required by the Discogs API
    /// * `timeout_sec` - Timeout applied to each individual request
    /// * `credentials` - Supplies bearer tokens for authenticated requests
    pub fn new(
        base_url: &str,
        user_agent: &str,
        timeout_sec: u64,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, CatalogClientError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_sec))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn releases_url(&self, subject: &str) -> String {
        format!(
            "{}/users/{}/collection/folders/0/releases",
            self.base_url,
            urlencoding::encode(subject)
        )
    }
}

#[async_trait]
impl CollectionSource for DiscogsClient {
    async fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> Result<RawCollectionPage, CatalogClientError> {
        let mut query = vec![
            ("page", request.page.to_string()),
            ("per_page", request.per_page.to_string()),
        ];
        if let Some(sort) = request.sort {
            query.push(("sort", sort.as_str().to_string()));
        }
        if let Some(order) = request.sort_order {
            query.push(("sort_order", order.as_str().to_string()));
        }

        let mut builder = self
            .client
            .get(self.releases_url(&request.subject))
            .query(&query);

        if request.auth == AuthMode::Authenticated {
            let token = self
                .credentials
                .access_token(&request.subject)
                .await
                .ok_or_else(|| CatalogClientError::MissingCredential(request.subject.clone()))?;
            builder = builder.bearer_auth(token);
        }

        debug!(
            "Requesting collection page {} for {} ({:?})",
            request.page, request.subject, request.auth
        );

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogClientError::Http {
                status: status.as_u16(),
                message: if message.is_empty() {
                    status.canonical_reason().unwrap_or("unknown").to_string()
                } else {
                    message
                },
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| CatalogClientError::Decode(e.to_string()))
    }
}
