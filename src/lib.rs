//! nodequery - An in-memory typed node store with a mongo-style query engine
//!
//! Nodes are held by id and by type. Queries select nodes of one or more
//! types with a nested operator filter, an optional multi-key sort and a
//! first-only flag. Equality on a single field is answered from a lazily
//! built secondary index; everything else scans.

pub mod core;
pub mod executor;
pub mod index;
pub mod observability;
pub mod planner;
pub mod store;

pub use crate::core::{CoreError, CoreResult, QueryConfig, QueryContext};
pub use crate::executor::{ExecutionResult, QueryOutcome};
pub use crate::planner::{Query, ResolvedFields, SortSpec};
pub use crate::store::{Node, NodeStore, ResolvedNode};
