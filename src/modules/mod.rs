//! Cross-cutting services module
//!
//! Observability hooks the analyzer reports through.

pub mod events;

pub use events::{
    AnalysisEvent, AnalysisFinishedEvent, AuditCompletedEvent, AuditFailedEvent,
    AuditRequestedEvent, EventDispatcher, EventHandler, FallbackEvent, LoggingHandler,
};
