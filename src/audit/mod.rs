//! Audit service access: transport, response model, and metric extraction.

pub mod client;
pub mod extract;
pub mod reqwest_client;
pub mod transport;
pub mod types;

pub use client::AuditClient;
pub use extract::{
    Accessor, LOAD_TIME_SOURCES, PAGE_SIZE_SOURCES, REQUEST_COUNT_SOURCES, extract_metrics,
    first_available,
};
pub use reqwest_client::ReqwestAuditHttpClient;
pub use transport::{AuditFailure, AuditHttpClient, AuditHttpResponse};
pub use types::{AuditResponse, LighthouseResult};

/// PageSpeed Insights v5 endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// Only the performance category is requested.
pub const PERFORMANCE_CATEGORY: &str = "PERFORMANCE";

/// Device profile the audit service emulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    #[default]
    Desktop,
    Mobile,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Desktop => "desktop",
            Strategy::Mobile => "mobile",
        }
    }
}
