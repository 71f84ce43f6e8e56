//! Output data model shared by the audit and simulation paths.
//!
//! A [`MetricsRecord`] is what callers receive from the analyzer regardless of
//! whether the numbers came from the audit service or from the simulator.

use std::fmt;

use serde::{Serialize, Serializer};

/// Sentinel rendered for metrics the audit service did not report.
pub const NOT_AVAILABLE: &str = "N/A";

/// Decimal value held as whole hundredths, rendered with exactly two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed2(i64);

impl Fixed2 {
    /// Rounds a value already expressed in hundredths, halves away from zero.
    pub fn from_hundredths(hundredths: f64) -> Self {
        Self(hundredths.round() as i64)
    }

    pub fn from_f64(value: f64) -> Self {
        Self::from_hundredths(value * 100.0)
    }

    pub fn hundredths(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Fixed2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Fixed2 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A metric that is either measured or explicitly unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricValue<T> {
    Value(T),
    NotAvailable,
}

impl<T> MetricValue<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, MetricValue::Value(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            MetricValue::Value(value) => Some(value),
            MetricValue::NotAvailable => None,
        }
    }
}

impl<T> From<Option<T>> for MetricValue<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(MetricValue::NotAvailable, MetricValue::Value)
    }
}

impl<T: fmt::Display> fmt::Display for MetricValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Value(value) => value.fmt(f),
            MetricValue::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl<T: Serialize> Serialize for MetricValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Value(value) => value.serialize(serializer),
            MetricValue::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

/// Normalised performance metrics for one analysed URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRecord {
    /// URL that was actually measured. For audited records this is the
    /// service-reported canonical URL, which may differ from the input.
    pub url: String,
    pub load_time_seconds: MetricValue<Fixed2>,
    #[serde(rename = "pageSizeKB")]
    pub page_size_kb: MetricValue<Fixed2>,
    pub request_count: MetricValue<u64>,
    pub performance_score: Option<u8>,
    pub is_simulated: bool,
}

impl MetricsRecord {
    /// Load time with its unit, e.g. `"2.35 seconds"`, or `"N/A"`.
    pub fn load_time_display(&self) -> String {
        with_unit(&self.load_time_seconds, "seconds")
    }

    /// Page size with its unit, e.g. `"800.00 KB"`, or `"N/A"`.
    pub fn page_size_display(&self) -> String {
        with_unit(&self.page_size_kb, "KB")
    }

    /// Which engine produced the numbers.
    pub fn source_label(&self) -> &'static str {
        if self.is_simulated {
            "Results generated using simulation (Demo mode)"
        } else {
            "Results powered by Google PageSpeed Insights API"
        }
    }
}

fn with_unit<T: fmt::Display>(value: &MetricValue<T>, unit: &str) -> String {
    match value {
        MetricValue::Value(v) => format!("{v} {unit}"),
        MetricValue::NotAvailable => NOT_AVAILABLE.to_string(),
    }
}
