// Reference snippets used to corroborate factual claims.
// The fact-check scorer never calls a provider itself; `ContentScorer` does the
// lookups once per scoring run and hands the results over as an `EvidenceSet`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSnippet {
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search endpoint returned status {0}")]
    Status(u16),
}

#[async_trait]
pub trait ReferenceProvider: Send + Sync {
    async fn search(&self, claim: &str) -> Result<Vec<ReferenceSnippet>, EvidenceError>;
}

/// Queries `GET {endpoint}?q=<claim>`, expecting a JSON array of `{url, snippet}`.
#[derive(Clone)]
pub struct HttpReferenceProvider {
    client: Client,
    endpoint: String,
}

impl HttpReferenceProvider {
    pub fn new(endpoint: String) -> Result<Self, EvidenceError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()?,
            endpoint,
        })
    }
}

#[async_trait]
impl ReferenceProvider for HttpReferenceProvider {
    async fn search(&self, claim: &str) -> Result<Vec<ReferenceSnippet>, EvidenceError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", claim)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EvidenceError::Status(status.as_u16()));
        }

        let snippets: Vec<ReferenceSnippet> = response.json().await?;
        debug!(results = snippets.len(), "reference search completed");
        Ok(snippets)
    }
}
