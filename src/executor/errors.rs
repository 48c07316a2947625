//! Executor error types
//!
//! Error codes:
//! - NODEQ_FILTER_INVALID (REJECT)

use std::fmt;

use super::filters::FilterError;

/// Severity levels for executor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller supplied a filter that cannot be compiled
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Executor-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// Filter failed to compile
    NodeqFilterInvalid,
}

impl ExecutorErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::NodeqFilterInvalid => "NODEQ_FILTER_INVALID",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error type with full context
#[derive(Debug, Clone)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
    source: Option<FilterError>,
}

impl ExecutorError {
    /// Create an invalid filter error
    pub fn invalid_filter(cause: FilterError) -> Self {
        Self {
            code: ExecutorErrorCode::NodeqFilterInvalid,
            message: format!("Invalid filter: {}", cause),
            source: Some(cause),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ExecutorErrorCode {
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

    /// Returns the underlying filter error
    pub fn filter_error(&self) -> Option<&FilterError> {
        self.source.as_ref()
    }
}

impl fmt::Display for ExecutorError {
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

impl std::error::Error for ExecutorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<FilterError> for ExecutorError {
    fn from(cause: FilterError) -> Self {
        Self::invalid_filter(cause)
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            ExecutorErrorCode::NodeqFilterInvalid.code(),
            "NODEQ_FILTER_INVALID"
        );
    }

    #[test]
    fn test_error_display() {
        let err = ExecutorError::invalid_filter(FilterError::UnknownOperator("between".into()));
        let display = format!("{}", err);
        assert!(display.contains("REJECT"));
        assert!(display.contains("NODEQ_FILTER_INVALID"));
        assert!(display.contains("between"));
        assert!(matches!(
            err.filter_error(),
            Some(FilterError::UnknownOperator(_))
        ));
    }
}
