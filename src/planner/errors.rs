//! Planner error types
//!
//! Error codes:
//! - NODEQ_QUERY_INVALID (REJECT)
//! - NODEQ_INDEX_SHORTCUT_FAILED (FATAL)

use std::fmt;

use crate::index::IndexError;

/// Severity levels for planner errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller supplied a malformed query
    Reject,
    /// The query cannot be answered; no fallback is attempted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// Malformed query arguments
    NodeqQueryInvalid,
    /// Indexed-equality shortcut failed while building or reading the index
    NodeqIndexShortcutFailed,
}

impl PlannerErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::NodeqQueryInvalid => "NODEQ_QUERY_INVALID",
            PlannerErrorCode::NodeqIndexShortcutFailed => "NODEQ_INDEX_SHORTCUT_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            PlannerErrorCode::NodeqQueryInvalid => Severity::Reject,
            PlannerErrorCode::NodeqIndexShortcutFailed => Severity::Fatal,
        }
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone)]
pub struct PlannerError {
    code: PlannerErrorCode,
    message: String,
    /// Field name if applicable
    field: Option<String>,
    source: Option<IndexError>,
}

impl PlannerError {
    /// Create a query invalid error
    pub fn query_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::NodeqQueryInvalid,
            message: reason.into(),
            field: None,
            source: None,
        }
    }

    /// Wrap an index failure raised by the indexed-equality shortcut
    pub fn index_shortcut_failed(field: impl Into<String>, cause: IndexError) -> Self {
        let field = field.into();
        Self {
            code: PlannerErrorCode::NodeqIndexShortcutFailed,
            message: format!("Index shortcut on field '{}' failed: {}", field, cause.message()),
            field: Some(field),
            source: Some(cause),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> PlannerErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the field name if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            PlannerErrorCode::NodeqQueryInvalid.code(),
            "NODEQ_QUERY_INVALID"
        );
        assert_eq!(
            PlannerErrorCode::NodeqIndexShortcutFailed.code(),
            "NODEQ_INDEX_SHORTCUT_FAILED"
        );
    }

    #[test]
    fn test_shortcut_failure_wraps_cause() {
        let cause = IndexError::invalid_path("fields/a..b", "empty path segment");
        let err = PlannerError::index_shortcut_failed("a..b", cause);

        assert_eq!(err.severity(), Severity::Fatal);
        assert_eq!(err.field(), Some("a..b"));
        assert!(err.source().is_some());

        let display = format!("{}", err);
        assert!(display.contains("FATAL"));
        assert!(display.contains("NODEQ_INDEX_SHORTCUT_FAILED"));
    }

    #[test]
    fn test_query_invalid_is_reject() {
        let err = PlannerError::query_invalid("bad sort");
        assert_eq!(err.severity(), Severity::Reject);
        assert!(err.field().is_none());
    }
}
