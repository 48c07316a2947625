//! Query Planner subsystem
//!
//! # Strategy Priority (first match wins)
//!
//! 1. Indexed equality: `{ fields: { <name>: { eq: v } } }` with a non-empty bucket
//! 2. Id equality: `{ id: { eq: "<id>" } }` with the node in the candidate types
//! 3. Full scan of every candidate type, handed to the executor
//!
//! A failure inside strategy 1 is fatal for the query.

mod ast;
mod errors;
#[allow(clippy::module_inception)]
mod planner;

pub use ast::{id_equality, Query, ResolvedFields, SortDirection, SortKey, SortSpec};
pub use errors::{PlannerError, PlannerErrorCode, PlannerResult, Severity};
pub use planner::{QueryPlan, QueryPlanner, ScanType};
