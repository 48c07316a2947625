//! Observable events
//!
//! Events are explicit and typed; their string names are what the logger
//! writes in the `event` field.

use std::fmt;

/// Observable events in the query core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration applied to a context
    ConfigLoaded,

    // Queries
    /// Query received by the planner
    QueryReceived,
    /// Planner chose a strategy
    QueryPlanned,
    /// Query executed successfully
    QueryExecuted,
    /// Query failed
    QueryFailed,
    /// Indexed-equality shortcut failed (fatal for the query)
    IndexShortcutFailed,

    // Indexes
    /// Index found stale and discarded
    IndexStale,

    // Resolved fields
    /// A resolver failed; the type keeps its previous cache entry
    ResolverFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::QueryReceived => "QUERY_RECEIVED",
            Event::QueryPlanned => "QUERY_PLANNED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryFailed => "QUERY_FAILED",
            Event::IndexShortcutFailed => "INDEX_SHORTCUT_FAILED",
            Event::IndexStale => "INDEX_STALE",
            Event::ResolverFailed => "RESOLVER_FAILED",
        }
    }

    /// Returns true if this event means the operation could not complete
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::QueryFailed | Event::IndexShortcutFailed | Event::ResolverFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::QueryReceived.as_str(), "QUERY_RECEIVED");
        assert_eq!(Event::QueryExecuted.as_str(), "QUERY_EXECUTED");
        assert_eq!(Event::IndexShortcutFailed.to_string(), "INDEX_SHORTCUT_FAILED");
    }

    #[test]
    fn test_failure_events() {
        assert!(Event::QueryFailed.is_failure());
        assert!(Event::IndexShortcutFailed.is_failure());
        assert!(!Event::QueryExecuted.is_failure());
        assert!(!Event::IndexStale.is_failure());
    }
}
