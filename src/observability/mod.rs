//! Observability subsystem
//!
//! - Structured logging (JSON lines)
//! - Query metrics (monotonic counters)
//! - Scoped start/complete logging
//!
//! Observability is read-only: nothing here influences planning or results.

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;

/// Log a typed event with fields.
///
/// Failure events are logged at ERROR, everything else at INFO.
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_failure() {
        Severity::Error
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

/// Log a typed event at TRACE (per-query detail)
pub fn trace_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(Severity::Trace, event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event(Event::ConfigLoaded, &[("log_level", "info")]);
        trace_event(Event::QueryReceived, &[]);
    }
}
