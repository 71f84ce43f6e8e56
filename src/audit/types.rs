//! Serde model of the PageSpeed Insights v5 response.
//!
//! Only the fields the extractor reads are modelled; everything else in the
//! (very large) Lighthouse report is ignored during deserialisation.

use std::collections::HashMap;

use serde::Deserialize;

/// Top-level response body returned by the audit service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    /// Canonical URL the service actually tested.
    #[serde(default)]
    pub id: Option<String>,
    pub lighthouse_result: LighthouseResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LighthouseResult {
    pub audits: HashMap<String, Audit>,
    #[serde(default)]
    pub categories: Option<Categories>,
}

impl LighthouseResult {
    pub fn audit(&self, id: &str) -> Option<&Audit> {
        self.audits.get(id)
    }

    /// Detail items of an audit, if both the audit and its item list exist.
    pub fn items(&self, id: &str) -> Option<&[AuditItem]> {
        self.audit(id)?.details.as_ref()?.items.as_deref()
    }

    pub fn performance_score(&self) -> Option<f64> {
        self.categories.as_ref()?.performance.as_ref()?.score
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    #[serde(default)]
    pub numeric_value: Option<f64>,
    #[serde(default)]
    pub details: Option<AuditDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditDetails {
    #[serde(default)]
    pub items: Option<Vec<AuditItem>>,
}

/// One resource-detail row. Rows of different audits carry different
/// fields, so every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditItem {
    #[serde(default)]
    pub transfer_size: Option<f64>,
    #[serde(default)]
    pub request_count: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Categories {
    #[serde(default)]
    pub performance: Option<Category>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub score: Option<f64>,
}
