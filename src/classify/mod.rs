//! Failure classification for audit calls.
//!
//! Decides whether a failed audit degrades to simulated metrics or surfaces
//! to the caller as a specific error kind.

use http::StatusCode;

use crate::audit::AuditFailure;

/// What the analyzer should do with a failed audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Substitute simulated metrics.
    FallbackEligible,
    InvalidInput,
    Timeout,
    UpstreamFailure,
}

impl FailureClass {
    pub fn is_terminal(self) -> bool {
        !matches!(self, FailureClass::FallbackEligible)
    }
}

/// Maps audit failures to a [`FailureClass`].
///
/// Rules, first match wins: 429/403 fall back, 400 is invalid input, a
/// transport timeout is a timeout, 5xx is an upstream failure, anything else
/// falls back.
#[derive(Debug, Clone, Copy)]
pub struct ErrorClassifier {
    fallback_on_malformed: bool,
}

impl ErrorClassifier {
    pub fn new() -> Self {
        Self {
            fallback_on_malformed: true,
        }
    }

    /// When disabled, an undecodable audit response is reported as an
    /// upstream failure instead of being papered over with simulated data.
    pub fn with_fallback_on_malformed(mut self, enabled: bool) -> Self {
        self.fallback_on_malformed = enabled;
        self
    }

    pub fn classify(&self, failure: &AuditFailure) -> FailureClass {
        let status = failure.status();

        if matches!(
            status,
            Some(StatusCode::TOO_MANY_REQUESTS) | Some(StatusCode::FORBIDDEN)
        ) {
            return FailureClass::FallbackEligible;
        }

        if status == Some(StatusCode::BAD_REQUEST) {
            return FailureClass::InvalidInput;
        }

        if failure.is_timeout() {
            return FailureClass::Timeout;
        }

        if status.is_some_and(|s| s.as_u16() >= 500) {
            return FailureClass::UpstreamFailure;
        }

        if !self.fallback_on_malformed && matches!(failure, AuditFailure::Malformed(_)) {
            return FailureClass::UpstreamFailure;
        }

        FailureClass::FallbackEligible
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifies with the default policy.
pub fn classify(failure: &AuditFailure) -> FailureClass {
    ErrorClassifier::default().classify(failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn status(code: u16) -> AuditFailure {
        AuditFailure::Status {
            status: StatusCode::from_u16(code).unwrap(),
            body: String::new(),
        }
    }

    #[test]
    fn capacity_statuses_fall_back() {
        assert_eq!(classify(&status(429)), FailureClass::FallbackEligible);
        assert_eq!(classify(&status(403)), FailureClass::FallbackEligible);
    }

    #[test]
    fn bad_request_is_invalid_input() {
        assert_eq!(classify(&status(400)), FailureClass::InvalidInput);
    }

    #[test]
    fn timeout_is_terminal() {
        let class = classify(&AuditFailure::Timeout(Duration::from_secs(30)));
        assert_eq!(class, FailureClass::Timeout);
        assert!(class.is_terminal());
    }

    #[test]
    fn server_errors_are_upstream_failures() {
        for code in [500, 502, 503, 504, 599] {
            assert_eq!(classify(&status(code)), FailureClass::UpstreamFailure, "{code}");
        }
    }

    #[test]
    fn everything_else_falls_back() {
        let failures = [
            status(404),
            status(401),
            status(302),
            AuditFailure::Connect("dns error: no such host".into()),
            AuditFailure::Transport("connection reset".into()),
            AuditFailure::Malformed("missing field `lighthouseResult`".into()),
        ];
        for failure in &failures {
            assert_eq!(classify(failure), FailureClass::FallbackEligible, "{failure}");
        }
    }

    #[test]
    fn malformed_can_be_made_terminal() {
        let classifier = ErrorClassifier::new().with_fallback_on_malformed(false);
        let malformed = AuditFailure::Malformed("expected value".into());
        assert_eq!(classifier.classify(&malformed), FailureClass::UpstreamFailure);
        assert_eq!(
            classifier.classify(&AuditFailure::Connect("refused".into())),
            FailureClass::FallbackEligible
        );
    }
}
