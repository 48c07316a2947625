//! Core Error Types
//!
//! Unified error type for the query context.

use thiserror::Error;

use crate::executor::ExecutorError;
use crate::planner::PlannerError;
use crate::store::StoreError;

/// Core module result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CoreError {
    /// Stable error code for logs and callers
    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(_) => "NODEQ_STORE_ERROR",
            Self::Planner(e) => e.code().code(),
            Self::Executor(e) => e.code().code(),
            Self::Config(_) => "NODEQ_CONFIG_INVALID",
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}
