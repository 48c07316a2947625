//! Match/Sort Executor subsystem
//!
//! # Execution Flow
//!
//! 1. Shortcut plans return their nodes as-is
//! 2. Compile the filter (unknown operators are rejected here)
//! 3. Id equality resolves through the shared store lookup
//! 4. first-only: first match in candidate order
//! 5. many: all matches, stable multi-key sort, `NotFound` on zero matches

mod errors;
#[allow(clippy::module_inception)]
mod executor;
mod filters;
mod result;
mod sorter;

pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult, Severity};
pub use executor::QueryExecutor;
pub use filters::{
    compile_glob, prepare_regex, CompiledFilter, FilterCompiler, FilterError, FilterResult,
    Operator,
};
pub use result::{ExecutionResult, QueryOutcome};
pub use sorter::ResultSorter;
