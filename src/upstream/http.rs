use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{token_url, Credentials, TokenFetcher};
use crate::error::RelayError;

/// [`TokenFetcher`] backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTokenFetcher {
    client: Client,
    base_url: String,
}

impl HttpTokenFetcher {
    /// `timeout` of `None` keeps the client's default (no overall deadline).
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, String> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl TokenFetcher for HttpTokenFetcher {
    async fn fetch(&self, credentials: &Credentials) -> Result<String, RelayError> {
        let url = token_url(&self.base_url, credentials);

        // reqwest errors embed the request URL, which carries the secret.
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RelayError::Request(e.without_url().to_string()))?;

        tracing::debug!(status = %response.status(), "Upstream responded");

        response
            .text()
            .await
            .map_err(|e| RelayError::ReadBody(e.without_url().to_string()))
    }
}
