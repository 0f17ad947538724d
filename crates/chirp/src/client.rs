//! Authenticated HTTP client for the upstream API.

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::error::FetchError;

/// HTTP Basic credentials for the local account.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Upstream API client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    credentials: Credentials,
}

impl ApiClient {
    /// Create a new client.
    pub fn new(credentials: Credentials, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            credentials,
        })
    }

    /// GET `url` with Basic auth and decode the body as JSON.
    pub async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
        let bytes = self.get_bytes(url, query, true).await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// GET `url` and return the raw body.
    ///
    /// `authenticated` controls whether Basic credentials are attached; image
    /// hosts do not need them.
    pub async fn get_bytes(
        &self,
        url: &str,
        query: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(url, ?query, "GET");

        let mut request = self.client.get(url).query(query);
        if authenticated {
            request = request.basic_auth(&self.credentials.user, Some(&self.credentials.password));
        }

        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let response = request.send().await.map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(http_err)?;
        Ok(bytes.to_vec())
    }
}
