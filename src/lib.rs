//! # pagemetrics-rs
//!
//! Page load time, transferred page size and request count for a public URL,
//! measured by Google PageSpeed Insights.
//!
//! When the audit service is rate limited, forbidden or unreachable the
//! analyzer substitutes plausibility-weighted simulated metrics, so callers
//! always get either a usable [`MetricsRecord`] or one of four
//! user-displayable errors ([`AnalyzeError`]). Records carry `is_simulated` to
//! tell the two apart.
//!
//! ## Example
//!
//! ```no_run
//! use pagemetrics_rs::PageAnalyzer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analyzer = PageAnalyzer::new()?;
//!     let record = analyzer.analyze("https://example.com").await?;
//!     println!("load time: {}", record.load_time_display());
//!     println!("page size: {}", record.page_size_display());
//!     println!("requests:  {}", record.request_count);
//!     Ok(())
//! }
//! ```

mod analyzer;

pub mod audit;
pub mod classify;
pub mod modules;
pub mod record;
pub mod simulation;

pub use crate::analyzer::{
    AnalysisOutcome,
    AnalysisReport,
    AnalyzeError,
    AnalyzeResult,
    AnalyzerConfig,
    BuildError,
    DEFAULT_TIMEOUT,
    ErrorKind,
    FailureCause,
    PageAnalyzer,
    PageAnalyzerBuilder,
};

pub use crate::audit::{
    AuditClient,
    AuditFailure,
    AuditHttpClient,
    AuditHttpResponse,
    AuditResponse,
    ReqwestAuditHttpClient,
    Strategy,
};

pub use crate::classify::{ErrorClassifier, FailureClass, classify};

pub use crate::modules::{
    AnalysisEvent,
    EventDispatcher,
    EventHandler,
    LoggingHandler,
};

pub use crate::record::{Fixed2, MetricValue, MetricsRecord, NOT_AVAILABLE};

pub use crate::simulation::{
    PopularityTier,
    SimulatedMetricsGenerator,
    SimulationError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
