//! Simulated metrics used when the audit service cannot be used.
//!
//! Values are drawn around tier-specific baselines so popular sites look
//! faster and heavier than the long tail. A short random delay mimics the
//! latency of a real audit.

use std::ops::Range;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::time::sleep;
use url::Url;

use crate::record::{Fixed2, MetricValue, MetricsRecord};

const DEFAULT_DELAY_MIN_MS: u64 = 2_000;
const DEFAULT_DELAY_MAX_MS: u64 = 5_000;

const MIN_LOAD_TIME_SECS: f64 = 0.5;
const LOAD_TIME_JITTER_SECS: f64 = 1.0;
const PAGE_SIZE_JITTER_KB: f64 = 800.0;
const REQUEST_JITTER: u64 = 30;

/// Hosts treated as popular when their name contains one of these.
pub const DEFAULT_POPULAR_HOSTS: [&str; 4] =
    ["google.com", "facebook.com", "amazon.com", "youtube.com"];

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("cannot simulate metrics for malformed URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Popularity tier of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopularityTier {
    Popular,
    Other,
}

/// Baselines and ranges for one tier.
#[derive(Debug, Clone)]
pub struct TierProfile {
    pub load_time_base: f64,
    pub page_size_base: f64,
    pub request_base: u64,
    pub score_range: Range<u8>,
}

impl PopularityTier {
    pub fn profile(self) -> TierProfile {
        match self {
            PopularityTier::Popular => TierProfile {
                load_time_base: 1.2,
                page_size_base: 1200.0,
                request_base: 45,
                score_range: 85..100,
            },
            PopularityTier::Other => TierProfile {
                load_time_base: 2.5,
                page_size_base: 800.0,
                request_base: 25,
                score_range: 60..90,
            },
        }
    }
}

/// Generates plausible metrics without touching the network.
#[derive(Debug, Clone)]
pub struct SimulatedMetricsGenerator {
    popular_hosts: Vec<String>,
    delay_min: Duration,
    delay_max: Duration,
    seed: Option<u64>,
}

impl SimulatedMetricsGenerator {
    pub fn new() -> Self {
        Self {
            popular_hosts: DEFAULT_POPULAR_HOSTS.iter().map(|h| h.to_string()).collect(),
            delay_min: Duration::from_millis(DEFAULT_DELAY_MIN_MS),
            delay_max: Duration::from_millis(DEFAULT_DELAY_MAX_MS),
            seed: None,
        }
    }

    /// Override the artificial latency range. `Duration::ZERO` for both
    /// disables the delay.
    pub fn with_delay_range(mut self, min: Duration, max: Duration) -> Self {
        self.delay_min = min;
        self.delay_max = if max < min { min } else { max };
        self
    }

    pub fn with_popular_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.popular_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Every call draws from a fresh RNG seeded with `seed`, so identical
    /// inputs produce identical records.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn tier_for(&self, url: &Url) -> PopularityTier {
        let host = url.host_str().unwrap_or_default();
        if self
            .popular_hosts
            .iter()
            .any(|popular| host.contains(popular.as_str()))
        {
            PopularityTier::Popular
        } else {
            PopularityTier::Other
        }
    }

    /// Sleeps for a random delay, then produces a simulated record.
    ///
    /// The URL is validated before sleeping so malformed input fails fast.
    pub async fn generate(&self, url: &str) -> Result<MetricsRecord, SimulationError> {
        let parsed = parse_url(url)?;
        let mut rng = self.rng();

        let delay = self.sample_delay(&mut rng);
        if delay > Duration::ZERO {
            log::debug!("simulating audit latency of {:.2}s for {url}", delay.as_secs_f64());
            sleep(delay).await;
        }

        Ok(self.record_for(url, &parsed, &mut rng))
    }

    /// Produces a simulated record from the given randomness source, without
    /// any delay.
    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        url: &str,
        rng: &mut R,
    ) -> Result<MetricsRecord, SimulationError> {
        let parsed = parse_url(url)?;
        Ok(self.record_for(url, &parsed, rng))
    }

    pub fn sample_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.delay_max <= self.delay_min {
            return self.delay_min;
        }
        let min = self.delay_min.as_secs_f64();
        let max = self.delay_max.as_secs_f64();
        Duration::from_secs_f64(rng.gen_range(min..=max))
    }

    fn record_for<R: Rng + ?Sized>(&self, url: &str, parsed: &Url, rng: &mut R) -> MetricsRecord {
        let profile = self.tier_for(parsed).profile();

        let load_time = (profile.load_time_base
            + rng.gen_range(-LOAD_TIME_JITTER_SECS..LOAD_TIME_JITTER_SECS))
        .max(MIN_LOAD_TIME_SECS);
        let page_size = profile.page_size_base + rng.gen_range(0.0..PAGE_SIZE_JITTER_KB);
        let requests = profile.request_base + rng.gen_range(0..REQUEST_JITTER);
        let score = rng.gen_range(profile.score_range.clone());

        MetricsRecord {
            url: url.to_string(),
            load_time_seconds: MetricValue::Value(Fixed2::from_f64(load_time)),
            page_size_kb: MetricValue::Value(Fixed2::from_f64(page_size)),
            request_count: MetricValue::Value(requests),
            performance_score: Some(score),
            is_simulated: true,
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Default for SimulatedMetricsGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_url(url: &str) -> Result<Url, SimulationError> {
    Url::parse(url).map_err(|source| SimulationError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}
