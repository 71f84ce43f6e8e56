//! Reqwest-based implementation of the `AuditHttpClient` trait.
//!
//! Provides a thin adapter around `reqwest::Client` that converts transport
//! errors into [`AuditFailure`] values the classifier understands.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{AuditFailure, AuditHttpClient, AuditHttpResponse};

/// Reqwest-backed HTTP client used to reach the audit service.
pub struct ReqwestAuditHttpClient {
    client: Client,
    timeout: Duration,
}

impl ReqwestAuditHttpClient {
    /// Creates a client whose requests are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pagemetrics-rs/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, timeout })
    }

    /// Wrap an existing reqwest client. `timeout` is only used to describe
    /// timeout failures; the client's own timeout still applies.
    pub fn from_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn map_error(&self, err: reqwest::Error) -> AuditFailure {
        if err.is_timeout() {
            AuditFailure::Timeout(self.timeout)
        } else if err.is_connect() {
            AuditFailure::Connect(err.to_string())
        } else if err.is_decode() {
            AuditFailure::Malformed(err.to_string())
        } else {
            AuditFailure::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl AuditHttpClient for ReqwestAuditHttpClient {
    async fn get(&self, url: &Url) -> Result<AuditHttpResponse, AuditFailure> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|err| self.map_error(err))?;

        let status = response.status();
        let final_url = response.url().clone();
        let body = response.bytes().await.map_err(|err| self.map_error(err))?;

        Ok(AuditHttpResponse::new(status, final_url, body))
    }
}
