//! Node store subsystem
//!
//! The authoritative in-memory record set queried by the planner.
//!
//! # Components
//!
//! - `NodeStore`: id -> node and type -> nodes maps, mutation generation
//! - `ResolvedCache`: per-type overlay values computed by external resolvers
//! - `DependencyTracker`: boundary to the incremental-build dependency layer
//!
//! # Invariants
//!
//! - `id` is unique across all types
//! - A node's type never changes after creation
//! - A type's resolved entry is replaced whole, never merged

mod dependency;
mod errors;
mod node;
mod resolved;
#[allow(clippy::module_inception)]
mod store;

pub use dependency::{DependencyTracker, MemoryDependencyTracker, PathDependency};
pub use errors::{StoreError, StoreResult};
pub use node::{split_path, FieldSource, Node, ResolvedNode, FIELDS_KEY, RESOLVED_KEY};
pub use resolved::{ResolveConcurrency, ResolvedCache, ResolvedEntries};
pub use store::NodeStore;
