//! Bearer credential lookup.
//!
//! The token exchange itself happens elsewhere; the client only asks for the
//! current token of a subject.

use async_trait::async_trait;

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current bearer token for `subject`, if one is available.
    async fn access_token(&self, subject: &str) -> Option<String>;
}

/// Uses one configured token for every subject.
pub struct StaticCredentialProvider {
    token: Option<String>,
}

impl StaticCredentialProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn access_token(&self, _subject: &str) -> Option<String> {
        self.token.clone()
    }
}
