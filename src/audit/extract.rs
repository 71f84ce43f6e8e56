//! Metric extraction from a decoded audit response.
//!
//! Each metric is read through an ordered list of named accessors. The first
//! accessor that yields a value wins; if none does, the metric is reported as
//! unavailable.

use crate::record::{Fixed2, MetricValue, MetricsRecord};

use super::types::{AuditResponse, LighthouseResult};

pub const LARGEST_CONTENTFUL_PAINT: &str = "largest-contentful-paint";
pub const FIRST_CONTENTFUL_PAINT: &str = "first-contentful-paint";
pub const TIME_TO_INTERACTIVE: &str = "interactive";
pub const RESOURCE_SUMMARY: &str = "resource-summary";
pub const NETWORK_REQUESTS: &str = "network-requests";

const BYTES_PER_KB: f64 = 1024.0;

/// Named read of one optional value out of a Lighthouse result.
#[derive(Clone, Copy)]
pub struct Accessor<T> {
    pub name: &'static str,
    pub read: fn(&LighthouseResult) -> Option<T>,
}

impl<T> Accessor<T> {
    pub const fn new(name: &'static str, read: fn(&LighthouseResult) -> Option<T>) -> Self {
        Self { name, read }
    }
}

/// Paint/interactivity timings in milliseconds, in preference order.
pub const LOAD_TIME_SOURCES: [Accessor<f64>; 3] = [
    Accessor::new(LARGEST_CONTENTFUL_PAINT, largest_contentful_paint),
    Accessor::new(FIRST_CONTENTFUL_PAINT, first_contentful_paint),
    Accessor::new(TIME_TO_INTERACTIVE, time_to_interactive),
];

/// Total transferred bytes.
pub const PAGE_SIZE_SOURCES: [Accessor<f64>; 1] =
    [Accessor::new(RESOURCE_SUMMARY, resource_summary_bytes)];

/// Number of network requests, in preference order.
pub const REQUEST_COUNT_SOURCES: [Accessor<u64>; 2] = [
    Accessor::new(NETWORK_REQUESTS, network_request_items),
    Accessor::new(RESOURCE_SUMMARY, resource_summary_requests),
];

/// Returns the name and value of the first accessor that yields a value.
pub fn first_available<T>(
    sources: &[Accessor<T>],
    result: &LighthouseResult,
) -> Option<(&'static str, T)> {
    sources
        .iter()
        .find_map(|source| (source.read)(result).map(|value| (source.name, value)))
}

/// Builds a non-simulated record from an audit response.
///
/// `requested_url` is only used when the service omitted the canonical `id`.
pub fn extract_metrics(response: &AuditResponse, requested_url: &str) -> MetricsRecord {
    let result = &response.lighthouse_result;

    let load_time = first_available(&LOAD_TIME_SOURCES, result);
    if let Some((source, millis)) = load_time {
        log::trace!("load time taken from {source}: {millis}ms");
    }

    MetricsRecord {
        url: response
            .id
            .clone()
            .unwrap_or_else(|| requested_url.to_string()),
        load_time_seconds: load_time
            .map(|(_, millis)| Fixed2::from_hundredths(millis / 10.0))
            .into(),
        page_size_kb: first_available(&PAGE_SIZE_SOURCES, result)
            .map(|(_, bytes)| Fixed2::from_hundredths(bytes * 100.0 / BYTES_PER_KB))
            .into(),
        request_count: MetricValue::from(
            first_available(&REQUEST_COUNT_SOURCES, result).map(|(_, count)| count),
        ),
        performance_score: result.performance_score().map(score_percent),
        is_simulated: false,
    }
}

fn numeric_value(result: &LighthouseResult, id: &str) -> Option<f64> {
    result
        .audit(id)?
        .numeric_value
        .filter(|value| value.is_finite())
}

fn largest_contentful_paint(result: &LighthouseResult) -> Option<f64> {
    numeric_value(result, LARGEST_CONTENTFUL_PAINT)
}

fn first_contentful_paint(result: &LighthouseResult) -> Option<f64> {
    numeric_value(result, FIRST_CONTENTFUL_PAINT)
}

fn time_to_interactive(result: &LighthouseResult) -> Option<f64> {
    numeric_value(result, TIME_TO_INTERACTIVE)
}

fn resource_summary_bytes(result: &LighthouseResult) -> Option<f64> {
    let items = result.items(RESOURCE_SUMMARY)?;
    Some(items.iter().map(|item| item.transfer_size.unwrap_or(0.0)).sum())
}

fn network_request_items(result: &LighthouseResult) -> Option<u64> {
    result.items(NETWORK_REQUESTS).map(|items| items.len() as u64)
}

fn resource_summary_requests(result: &LighthouseResult) -> Option<u64> {
    let items = result.items(RESOURCE_SUMMARY)?;
    let total: f64 = items.iter().map(|item| item.request_count.unwrap_or(0.0)).sum();
    Some(total.max(0.0).round() as u64)
}

fn score_percent(score: f64) -> u8 {
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}
