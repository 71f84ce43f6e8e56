//! Audit client: one request to the audit service, one extracted record.

use std::sync::Arc;

use url::Url;

use crate::record::MetricsRecord;

use super::extract::extract_metrics;
use super::types::AuditResponse;
use super::{AuditFailure, AuditHttpClient, PERFORMANCE_CATEGORY, Strategy};

/// Longest prefix of an error body kept on [`AuditFailure::Status`].
const ERROR_BODY_LIMIT: usize = 512;

/// Issues a performance audit for a URL and normalises the result.
#[derive(Clone)]
pub struct AuditClient {
    http: Arc<dyn AuditHttpClient>,
    endpoint: Url,
    strategy: Strategy,
}

impl AuditClient {
    pub fn new(http: Arc<dyn AuditHttpClient>, endpoint: Url, strategy: Strategy) -> Self {
        Self {
            http,
            endpoint,
            strategy,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Full request URL for auditing `target`.
    pub fn request_url(&self, target: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("url", target)
            .append_pair("strategy", self.strategy.as_str())
            .append_pair("category", PERFORMANCE_CATEGORY);
        url
    }

    /// Fetches one audit for `target` and extracts a non-simulated record.
    pub async fn fetch(&self, target: &str) -> Result<MetricsRecord, AuditFailure> {
        let request_url = self.request_url(target);
        let response = self.http.get(&request_url).await?;

        if !response.status.is_success() {
            return Err(AuditFailure::Status {
                status: response.status,
                body: truncated_body(&response.body),
            });
        }

        let decoded: AuditResponse = serde_json::from_slice(&response.body)
            .map_err(|err| AuditFailure::Malformed(err.to_string()))?;

        Ok(extract_metrics(&decoded, target))
    }
}

fn truncated_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let cut = text.char_indices().nth(ERROR_BODY_LIMIT).map(|(idx, _)| idx);
    match cut {
        Some(idx) => format!("{}…", &text[..idx]),
        None => text.into_owned(),
    }
}
