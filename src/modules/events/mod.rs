//! Event system for the analyzer.
//!
//! Provides hooks for logging and custom reactions around each analysis
//! without the analyzer writing to any process-wide sink itself.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::analyzer::AnalysisOutcome;
use crate::classify::FailureClass;

/// Emitted right before the audit service is called.
#[derive(Debug, Clone)]
pub struct AuditRequestedEvent {
    pub target: String,
    pub request_url: Url,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when the audit service produced a usable record.
#[derive(Debug, Clone)]
pub struct AuditCompletedEvent {
    pub target: String,
    pub measured_url: String,
    pub latency: Duration,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AuditFailedEvent {
    pub target: String,
    pub status: Option<u16>,
    pub error: String,
    pub class: FailureClass,
    pub latency: Duration,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FallbackEvent {
    pub target: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AnalysisFinishedEvent {
    pub target: String,
    pub outcome: AnalysisOutcome,
    pub elapsed: Duration,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    AuditRequested(AuditRequestedEvent),
    AuditCompleted(AuditCompletedEvent),
    AuditFailed(AuditFailedEvent),
    FallbackStarted(FallbackEvent),
    Finished(AnalysisFinishedEvent),
}

/// Trait implemented by event handlers.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &AnalysisEvent);
}

/// Dispatcher that broadcasts events to registered handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn register_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn dispatch(&self, event: AnalysisEvent) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

/// Logs events using the `log` crate.
#[derive(Debug)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle(&self, event: &AnalysisEvent) {
        match event {
            AnalysisEvent::AuditRequested(req) => {
                log::debug!("-> audit {} ({})", req.target, req.request_url);
            }
            AnalysisEvent::AuditCompleted(done) => {
                log::debug!(
                    "<- audit {} measured {} ({:.2}s)",
                    done.target,
                    done.measured_url,
                    done.latency.as_secs_f64()
                );
            }
            AnalysisEvent::AuditFailed(failed) => {
                log::warn!(
                    "audit {} failed after {:.2}s: {} ({:?})",
                    failed.target,
                    failed.latency.as_secs_f64(),
                    failed.error,
                    failed.class
                );
            }
            AnalysisEvent::FallbackStarted(fallback) => {
                log::info!("simulating metrics for {}: {}", fallback.target, fallback.reason);
            }
            AnalysisEvent::Finished(finished) => {
                log::info!(
                    "analysis {} finished as {:?} in {:.2}s",
                    finished.target,
                    finished.outcome,
                    finished.elapsed.as_secs_f64()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingHandler(std::sync::Mutex<usize>);

    impl EventHandler for CountingHandler {
        fn handle(&self, _event: &AnalysisEvent) {
            *self.0.lock().unwrap() += 1;
        }
    }

    #[test]
    fn dispatches_to_handlers() {
        let mut dispatcher = EventDispatcher::new();
        assert!(dispatcher.is_empty());
        let counter = Arc::new(CountingHandler(std::sync::Mutex::new(0)));
        dispatcher.register_handler(counter.clone());
        dispatcher.register_handler(Arc::new(LoggingHandler));
        dispatcher.dispatch(AnalysisEvent::FallbackStarted(FallbackEvent {
            target: "https://example.com".into(),
            reason: "HTTP 429".into(),
            timestamp: Utc::now(),
        }));
        assert_eq!(*counter.0.lock().unwrap(), 1);
    }
}
