//! Transport abstraction for audit service calls.
//!
//! The audit client only needs a single GET; hiding it behind a trait lets the
//! orchestration layer be exercised with stub transports.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use thiserror::Error;
use url::Url;

/// Contract for the HTTP transport used to reach the audit service.
#[async_trait]
pub trait AuditHttpClient: Send + Sync {
    /// Issues one GET. Non-2xx statuses are returned as responses, not
    /// errors; only transport-level problems are failures here.
    async fn get(&self, url: &Url) -> Result<AuditHttpResponse, AuditFailure>;
}

/// Minimal response representation returned by the transport.
#[derive(Debug, Clone)]
pub struct AuditHttpResponse {
    pub status: StatusCode,
    pub url: Url,
    pub body: Bytes,
}

impl AuditHttpResponse {
    pub fn new(status: StatusCode, url: Url, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            url,
            body: body.into(),
        }
    }
}

/// Everything that can go wrong while fetching and decoding one audit.
#[derive(Debug, Error)]
pub enum AuditFailure {
    #[error("audit service responded with HTTP {status}")]
    Status { status: StatusCode, body: String },
    #[error("audit request timed out after {0:?}")]
    Timeout(Duration),
    #[error("could not connect to audit service: {0}")]
    Connect(String),
    #[error("audit transport error: {0}")]
    Transport(String),
    #[error("malformed audit response: {0}")]
    Malformed(String),
}

impl AuditFailure {
    /// HTTP status reported by the service, if the request got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AuditFailure::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AuditFailure::Timeout(_))
    }
}
