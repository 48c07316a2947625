//! Index error types
//!
//! Error codes:
//! - NODEQ_INDEX_INVALID_PATH (FATAL)
//!
//! Index failures are never recovered from by falling back to a scan; the
//! planner logs them and hands them to the caller.

use std::fmt;

/// Severity levels for index errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The query must fail
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// Field path cannot address an attribute
    NodeqIndexInvalidPath,
}

impl IndexErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::NodeqIndexInvalidPath => "NODEQ_INDEX_INVALID_PATH",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error type with full context
#[derive(Debug, Clone)]
pub struct IndexError {
    code: IndexErrorCode,
    message: String,
    path: String,
}

impl IndexError {
    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            code: IndexErrorCode::NodeqIndexInvalidPath,
            message: format!("Invalid field path '{}': {}", path, reason.into()),
            path,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> IndexErrorCode {
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

    /// Returns the offending field path
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for IndexError {}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            IndexErrorCode::NodeqIndexInvalidPath.code(),
            "NODEQ_INDEX_INVALID_PATH"
        );
    }

    #[test]
    fn test_error_display() {
        let err = IndexError::invalid_path("fields/", "empty field name");
        let display = format!("{}", err);
        assert!(display.contains("NODEQ_INDEX_INVALID_PATH"));
        assert!(display.contains("FATAL"));
        assert!(display.contains("fields/"));
        assert_eq!(err.path(), "fields/");
    }
}
