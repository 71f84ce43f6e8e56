//! High level analysis orchestration.
//!
//! Wires together the audit client, the failure classifier and the metrics
//! simulator behind a single `analyze` call that either yields a usable
//! [`MetricsRecord`] or one of four user-displayable errors.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::time::timeout;
use url::Url;

use crate::audit::{
	AuditClient, AuditFailure, AuditHttpClient, DEFAULT_ENDPOINT, ReqwestAuditHttpClient,
	Strategy,
};
use crate::classify::{ErrorClassifier, FailureClass};
use crate::modules::events::{
	AnalysisEvent, AnalysisFinishedEvent, AuditCompletedEvent, AuditFailedEvent,
	AuditRequestedEvent, EventDispatcher, EventHandler, FallbackEvent, LoggingHandler,
};
use crate::record::MetricsRecord;
use crate::simulation::{DEFAULT_POPULAR_HOSTS, SimulatedMetricsGenerator, SimulationError};

/// Hard upper bound on one audit call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result alias used across the orchestration layer.
pub type AnalyzeResult<T> = Result<T, AnalyzeError>;

/// Coarse error kind for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	InvalidInput,
	Timeout,
	UpstreamFailure,
	Unreachable,
}

/// Underlying cause kept on an [`AnalyzeError`] for diagnostics.
#[derive(Debug, Error)]
pub enum FailureCause {
	#[error(transparent)]
	Audit(#[from] AuditFailure),
	#[error(transparent)]
	Simulation(#[from] SimulationError),
}

/// Error surfaced by [`PageAnalyzer::analyze`]. The `Display` text is meant
/// to be shown to end users as is.
#[derive(Debug, Error)]
pub enum AnalyzeError {
	#[error("Invalid URL provided. Please check the URL and try again.")]
	InvalidInput(#[source] FailureCause),
	#[error("Request timed out. The website might be slow to respond.")]
	Timeout(#[source] AuditFailure),
	#[error("Server error. Please try again later.")]
	UpstreamFailure(#[source] AuditFailure),
	#[error("Unable to analyze the URL. Please check the URL and your internet connection.")]
	Unreachable(#[source] FailureCause),
}

impl AnalyzeError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			AnalyzeError::InvalidInput(_) => ErrorKind::InvalidInput,
			AnalyzeError::Timeout(_) => ErrorKind::Timeout,
			AnalyzeError::UpstreamFailure(_) => ErrorKind::UpstreamFailure,
			AnalyzeError::Unreachable(_) => ErrorKind::Unreachable,
		}
	}
}

impl From<SimulationError> for AnalyzeError {
	fn from(err: SimulationError) -> Self {
		AnalyzeError::InvalidInput(FailureCause::Simulation(err))
	}
}

/// Errors raised while building a [`PageAnalyzer`].
#[derive(Debug, Error)]
pub enum BuildError {
	#[error("invalid audit endpoint '{endpoint}': {source}")]
	Endpoint {
		endpoint: String,
		#[source]
		source: url::ParseError,
	},
	#[error("http client initialisation failed: {0}")]
	Http(#[from] reqwest::Error),
}

/// Terminal state of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisOutcome {
	/// The audit service produced the record.
	Succeeded,
	/// The audit failed and simulated metrics were substituted.
	FellBack,
	Failed(ErrorKind),
}

/// A record together with the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
	pub record: MetricsRecord,
	pub outcome: AnalysisOutcome,
}

/// Analyzer configuration used by the builder.
#[derive(Clone)]
pub struct AnalyzerConfig {
	pub endpoint: String,
	pub strategy: Strategy,
	pub timeout: Duration,
	pub fallback_enabled: bool,
	pub fallback_on_malformed: bool,
	pub simulation_delay_min: Duration,
	pub simulation_delay_max: Duration,
	pub popular_hosts: Vec<String>,
	pub simulation_seed: Option<u64>,
	pub audit_client: Option<Arc<dyn AuditHttpClient>>,
	pub handlers: Vec<Arc<dyn EventHandler>>,
	pub default_logging: bool,
}

impl Default for AnalyzerConfig {
	fn default() -> Self {
		Self {
			endpoint: DEFAULT_ENDPOINT.to_string(),
			strategy: Strategy::Desktop,
			timeout: DEFAULT_TIMEOUT,
			fallback_enabled: true,
			fallback_on_malformed: true,
			simulation_delay_min: Duration::from_secs(2),
			simulation_delay_max: Duration::from_secs(5),
			popular_hosts: DEFAULT_POPULAR_HOSTS.iter().map(|h| h.to_string()).collect(),
			simulation_seed: None,
			audit_client: None,
			handlers: Vec::new(),
			default_logging: true,
		}
	}
}

/// Fluent builder for [`PageAnalyzer`].
pub struct PageAnalyzerBuilder {
	config: AnalyzerConfig,
}

impl PageAnalyzerBuilder {
	pub fn new() -> Self {
		Self {
			config: AnalyzerConfig::default(),
		}
	}

	pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.config.endpoint = endpoint.into();
		self
	}

	pub fn with_strategy(mut self, strategy: Strategy) -> Self {
		self.config.strategy = strategy;
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.config.timeout = timeout;
		self
	}

	/// Replace the HTTP transport, e.g. with a stub in tests.
	pub fn with_audit_client(mut self, client: Arc<dyn AuditHttpClient>) -> Self {
		self.config.audit_client = Some(client);
		self
	}

	pub fn with_simulation_delay(mut self, min: Duration, max: Duration) -> Self {
		self.config.simulation_delay_min = min;
		self.config.simulation_delay_max = max;
		self
	}

	pub fn with_popular_hosts<I, S>(mut self, hosts: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.config.popular_hosts = hosts.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_seed(mut self, seed: u64) -> Self {
		self.config.simulation_seed = Some(seed);
		self
	}

	pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
		self.config.handlers.push(handler);
		self
	}

	/// Fallback-eligible failures surface as `Unreachable` instead of
	/// producing simulated metrics.
	pub fn disable_fallback(mut self) -> Self {
		self.config.fallback_enabled = false;
		self
	}

	pub fn fallback_on_malformed(mut self, enabled: bool) -> Self {
		self.config.fallback_on_malformed = enabled;
		self
	}

	pub fn without_default_logging(mut self) -> Self {
		self.config.default_logging = false;
		self
	}

	pub fn build(self) -> Result<PageAnalyzer, BuildError> {
		PageAnalyzer::with_config(self.config)
	}
}

impl Default for PageAnalyzerBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Main analysis entry point.
///
/// Holds no per-request state; share it behind an `Arc` and call
/// [`analyze`](Self::analyze) concurrently.
pub struct PageAnalyzer {
	audit: AuditClient,
	classifier: ErrorClassifier,
	simulator: SimulatedMetricsGenerator,
	events: Arc<EventDispatcher>,
	timeout: Duration,
	fallback_enabled: bool,
}

impl PageAnalyzer {
	/// Construct an analyzer with default configuration.
	pub fn new() -> Result<Self, BuildError> {
		PageAnalyzer::with_config(AnalyzerConfig::default())
	}

	pub fn builder() -> PageAnalyzerBuilder {
		PageAnalyzerBuilder::new()
	}

	pub fn with_config(config: AnalyzerConfig) -> Result<Self, BuildError> {
		let endpoint = Url::parse(&config.endpoint).map_err(|source| BuildError::Endpoint {
			endpoint: config.endpoint.clone(),
			source,
		})?;

		let http: Arc<dyn AuditHttpClient> = match config.audit_client {
			Some(client) => client,
			None => Arc::new(ReqwestAuditHttpClient::new(config.timeout)?),
		};

		let mut simulator = SimulatedMetricsGenerator::new()
			.with_delay_range(config.simulation_delay_min, config.simulation_delay_max)
			.with_popular_hosts(config.popular_hosts);
		if let Some(seed) = config.simulation_seed {
			simulator = simulator.with_seed(seed);
		}

		let mut events = EventDispatcher::new();
		if config.default_logging {
			events.register_handler(Arc::new(LoggingHandler));
		}
		for handler in config.handlers {
			events.register_handler(handler);
		}

		Ok(Self {
			audit: AuditClient::new(http, endpoint, config.strategy),
			classifier: ErrorClassifier::new()
				.with_fallback_on_malformed(config.fallback_on_malformed),
			simulator,
			events: Arc::new(events),
			timeout: config.timeout,
			fallback_enabled: config.fallback_enabled,
		})
	}

	/// Measure `url`, falling back to simulated metrics when the audit
	/// service is unavailable.
	pub async fn analyze(&self, url: &str) -> AnalyzeResult<MetricsRecord> {
		self.analyze_detailed(url).await.map(|report| report.record)
	}

	/// Like [`analyze`](Self::analyze) but also reports which path produced
	/// the record.
	pub async fn analyze_detailed(&self, url: &str) -> AnalyzeResult<AnalysisReport> {
		let started = Instant::now();
		let result = self.run(url).await;

		let outcome = match &result {
			Ok(report) => report.outcome,
			Err(err) => AnalysisOutcome::Failed(err.kind()),
		};
		self.events.dispatch(AnalysisEvent::Finished(AnalysisFinishedEvent {
			target: url.to_string(),
			outcome,
			elapsed: started.elapsed(),
			timestamp: chrono::Utc::now(),
		}));

		result
	}

	/// Simulated metrics only, without contacting the audit service.
	pub async fn simulate(&self, url: &str) -> AnalyzeResult<MetricsRecord> {
		Ok(self.simulator.generate(url).await?)
	}

	async fn run(&self, url: &str) -> AnalyzeResult<AnalysisReport> {
		self.events.dispatch(AnalysisEvent::AuditRequested(AuditRequestedEvent {
			target: url.to_string(),
			request_url: self.audit.request_url(url),
			timestamp: chrono::Utc::now(),
		}));

		let started = Instant::now();
		let failure = match timeout(self.timeout, self.audit.fetch(url)).await {
			Ok(Ok(record)) => {
				self.events.dispatch(AnalysisEvent::AuditCompleted(AuditCompletedEvent {
					target: url.to_string(),
					measured_url: record.url.clone(),
					latency: started.elapsed(),
					timestamp: chrono::Utc::now(),
				}));
				return Ok(AnalysisReport {
					record,
					outcome: AnalysisOutcome::Succeeded,
				});
			}
			Ok(Err(failure)) => failure,
			Err(_) => AuditFailure::Timeout(self.timeout),
		};

		let class = self.classifier.classify(&failure);
		self.events.dispatch(AnalysisEvent::AuditFailed(AuditFailedEvent {
			target: url.to_string(),
			status: failure.status().map(|s| s.as_u16()),
			error: failure.to_string(),
			class,
			latency: started.elapsed(),
			timestamp: chrono::Utc::now(),
		}));

		match class {
			FailureClass::InvalidInput => Err(AnalyzeError::InvalidInput(failure.into())),
			FailureClass::Timeout => Err(AnalyzeError::Timeout(failure)),
			FailureClass::UpstreamFailure => Err(AnalyzeError::UpstreamFailure(failure)),
			FailureClass::FallbackEligible => self.fall_back(url, failure).await,
		}
	}

	async fn fall_back(&self, url: &str, failure: AuditFailure) -> AnalyzeResult<AnalysisReport> {
		if !self.fallback_enabled {
			return Err(AnalyzeError::Unreachable(failure.into()));
		}

		self.events.dispatch(AnalysisEvent::FallbackStarted(FallbackEvent {
			target: url.to_string(),
			reason: failure.to_string(),
			timestamp: chrono::Utc::now(),
		}));

		match self.simulator.generate(url).await {
			Ok(record) => Ok(AnalysisReport {
				record,
				outcome: AnalysisOutcome::FellBack,
			}),
			Err(err) => Err(AnalyzeError::Unreachable(err.into())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::audit::AuditHttpResponse;
	use crate::record::MetricValue;
	use crate::simulation::PopularityTier;
	use async_trait::async_trait;
	use http::StatusCode;
	use std::collections::VecDeque;
	use std::error::Error as _;
	use std::sync::Mutex;
	use std::sync::atomic::{AtomicUsize, Ordering};

	const LCP_BODY: &str = r#"{
		"id": "https://www.example.com/",
		"lighthouseResult": {
			"audits": {
				"largest-contentful-paint": { "numericValue": 2345 },
				"resource-summary": { "details": { "items": [
					{ "transferSize": 512000, "requestCount": 12 },
					{ "transferSize": 307200, "requestCount": 8 }
				]}}
			},
			"categories": { "performance": { "score": 0.91 } }
		}
	}"#;

	enum Reply {
		Status(u16, &'static str),
		Fail(AuditFailure),
		Hang,
	}

	struct StubClient {
		replies: Mutex<VecDeque<Reply>>,
		calls: AtomicUsize,
	}

	impl StubClient {
		fn new(reply: Reply) -> Arc<Self> {
			Arc::new(Self {
				replies: Mutex::new(VecDeque::from([reply])),
				calls: AtomicUsize::new(0),
			})
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl AuditHttpClient for StubClient {
		async fn get(&self, url: &Url) -> Result<AuditHttpResponse, AuditFailure> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			let reply = self
				.replies
				.lock()
				.unwrap()
				.pop_front()
				.expect("no more stub replies");
			match reply {
				Reply::Status(code, body) => Ok(AuditHttpResponse::new(
					StatusCode::from_u16(code).unwrap(),
					url.clone(),
					body,
				)),
				Reply::Fail(failure) => Err(failure),
				Reply::Hang => {
					tokio::time::sleep(Duration::from_secs(60)).await;
					Err(AuditFailure::Transport("stub hung".into()))
				}
			}
		}
	}

	#[derive(Default)]
	struct CapturingHandler(Mutex<Vec<AnalysisEvent>>);

	impl EventHandler for CapturingHandler {
		fn handle(&self, event: &AnalysisEvent) {
			self.0.lock().unwrap().push(event.clone());
		}
	}

	fn builder(stub: Arc<StubClient>) -> PageAnalyzerBuilder {
		PageAnalyzer::builder()
			.with_audit_client(stub)
			.with_simulation_delay(Duration::ZERO, Duration::ZERO)
			.without_default_logging()
	}

	fn analyzer(stub: Arc<StubClient>) -> PageAnalyzer {
		builder(stub).build().unwrap()
	}

	#[tokio::test]
	async fn audit_success_is_returned_unchanged() {
		let stub = StubClient::new(Reply::Status(200, LCP_BODY));
		let report = analyzer(stub.clone())
			.analyze_detailed("https://example.com")
			.await
			.unwrap();

		assert_eq!(report.outcome, AnalysisOutcome::Succeeded);
		let record = report.record;
		assert_eq!(record.url, "https://www.example.com/");
		assert_eq!(record.load_time_seconds.to_string(), "2.35");
		assert_eq!(record.page_size_kb.to_string(), "800.00");
		assert_eq!(record.request_count, MetricValue::Value(20));
		assert_eq!(record.performance_score, Some(91));
		assert!(!record.is_simulated);
		assert_eq!(stub.calls(), 1);
	}

	#[tokio::test]
	async fn rate_limit_falls_back_to_simulation() {
		let stub = StubClient::new(Reply::Status(429, "quota"));
		let report = analyzer(stub.clone())
			.analyze_detailed("https://www.google.com")
			.await
			.unwrap();

		assert_eq!(report.outcome, AnalysisOutcome::FellBack);
		let record = report.record;
		assert!(record.is_simulated);
		assert_eq!(record.url, "https://www.google.com");
		let profile = PopularityTier::Popular.profile();
		let score = record.performance_score.unwrap();
		assert!(profile.score_range.contains(&score));
		let requests = *record.request_count.value().unwrap();
		assert!((45..75).contains(&requests));
		assert_eq!(stub.calls(), 1);
	}

	#[tokio::test]
	async fn forbidden_falls_back_to_simulation() {
		let stub = StubClient::new(Reply::Status(403, ""));
		let record = analyzer(stub).analyze("https://example.com").await.unwrap();
		assert!(record.is_simulated);
		let score = record.performance_score.unwrap();
		assert!((60..90).contains(&score));
	}

	#[tokio::test]
	async fn bad_request_is_invalid_input() {
		let stub = StubClient::new(Reply::Status(400, "bad url"));
		let err = analyzer(stub).analyze("https://example.com").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::InvalidInput);
		assert_eq!(
			err.to_string(),
			"Invalid URL provided. Please check the URL and try again."
		);
		assert!(err.source().is_some());
	}

	#[tokio::test]
	async fn server_error_is_upstream_failure() {
		let stub = StubClient::new(Reply::Status(503, "unavailable"));
		let err = analyzer(stub).analyze("https://example.com").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
	}

	#[tokio::test]
	async fn transport_timeout_is_reported() {
		let stub = StubClient::new(Reply::Fail(AuditFailure::Timeout(DEFAULT_TIMEOUT)));
		let err = analyzer(stub).analyze("https://example.com").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Timeout);
		assert_eq!(
			err.to_string(),
			"Request timed out. The website might be slow to respond."
		);
	}

	#[tokio::test]
	async fn hard_timeout_bounds_slow_transports() {
		let stub = StubClient::new(Reply::Hang);
		let analyzer = builder(stub)
			.with_timeout(Duration::from_millis(50))
			.build()
			.unwrap();
		let started = Instant::now();
		let err = analyzer.analyze("https://example.com").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Timeout);
		assert!(started.elapsed() < Duration::from_secs(10));
	}

	#[tokio::test]
	async fn unreachable_when_simulation_also_fails() {
		let stub = StubClient::new(Reply::Fail(AuditFailure::Connect(
			"dns error: failed to lookup address".into(),
		)));
		let err = analyzer(stub).analyze("not a url").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Unreachable);
		assert!(matches!(
			err,
			AnalyzeError::Unreachable(FailureCause::Simulation(_))
		));
	}

	#[tokio::test]
	async fn malformed_response_falls_back_by_default() {
		let stub = StubClient::new(Reply::Status(200, "<html>not json</html>"));
		let record = analyzer(stub).analyze("https://example.com").await.unwrap();
		assert!(record.is_simulated);
	}

	#[tokio::test]
	async fn malformed_response_can_be_terminal() {
		let stub = StubClient::new(Reply::Status(200, "<html>not json</html>"));
		let analyzer = builder(stub).fallback_on_malformed(false).build().unwrap();
		let err = analyzer.analyze("https://example.com").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
	}

	#[tokio::test]
	async fn disabled_fallback_reports_unreachable() {
		let stub = StubClient::new(Reply::Status(429, ""));
		let analyzer = builder(stub).disable_fallback().build().unwrap();
		let err = analyzer.analyze("https://example.com").await.unwrap_err();
		assert!(matches!(err, AnalyzeError::Unreachable(FailureCause::Audit(_))));
	}

	#[tokio::test]
	async fn seeded_fallback_is_deterministic() {
		let first = builder(StubClient::new(Reply::Status(429, "")))
			.with_seed(11)
			.build()
			.unwrap()
			.analyze("https://example.com")
			.await
			.unwrap();
		let second = builder(StubClient::new(Reply::Status(403, "")))
			.with_seed(11)
			.build()
			.unwrap()
			.analyze("https://example.com")
			.await
			.unwrap();
		assert_eq!(first, second);
	}

	#[tokio::test]
	async fn emits_events_in_order() {
		let handler = Arc::new(CapturingHandler::default());
		let analyzer = builder(StubClient::new(Reply::Status(429, "")))
			.with_handler(handler.clone())
			.build()
			.unwrap();
		analyzer.analyze("https://example.com").await.unwrap();

		let events = handler.0.lock().unwrap();
		let names: Vec<&str> = events
			.iter()
			.map(|event| match event {
				AnalysisEvent::AuditRequested(_) => "requested",
				AnalysisEvent::AuditCompleted(_) => "completed",
				AnalysisEvent::AuditFailed(_) => "failed",
				AnalysisEvent::FallbackStarted(_) => "fallback",
				AnalysisEvent::Finished(_) => "finished",
			})
			.collect();
		assert_eq!(names, ["requested", "failed", "fallback", "finished"]);

		match &events[1] {
			AnalysisEvent::AuditFailed(failed) => {
				assert_eq!(failed.status, Some(429));
				assert_eq!(failed.class, FailureClass::FallbackEligible);
			}
			other => panic!("unexpected event {other:?}"),
		}
		match &events[3] {
			AnalysisEvent::Finished(finished) => {
				assert_eq!(finished.outcome, AnalysisOutcome::FellBack)
			}
			other => panic!("unexpected event {other:?}"),
		}
	}

	#[tokio::test]
	async fn simulate_rejects_malformed_url_as_invalid_input() {
		let stub = StubClient::new(Reply::Status(200, LCP_BODY));
		let analyzer = analyzer(stub.clone());
		let err = analyzer.simulate("::nope").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::InvalidInput);
		assert_eq!(stub.calls(), 0);
	}

	#[test]
	fn invalid_endpoint_is_a_build_error() {
		let result = PageAnalyzer::builder()
			.with_endpoint("not an endpoint")
			.with_audit_client(StubClient::new(Reply::Hang))
			.build();
		assert!(matches!(result, Err(BuildError::Endpoint { .. })));
	}
}
