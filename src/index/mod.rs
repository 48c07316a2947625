//! Secondary index subsystem
//!
//! Indexes are derived, in-memory-only state built lazily from the node
//! store the first time a query shape needs them.
//!
//! # Design Principles
//!
//! - Derived state: indexes mirror the store, never the source of truth
//! - Lazy: nothing is built until a query asks for it
//! - Point-in-time: an index reflects the store generation it was built at
//!
//! # Invariants
//!
//! - Types are keyed as a set: order and duplicates do not matter
//! - Array-valued fields are indexed once per distinct element
//! - Null, objects and undefined paths are never indexed

mod errors;
mod key;
mod manager;

pub use errors::{IndexError, IndexErrorCode, IndexResult, Severity};
pub use key::IndexKey;
pub use manager::{FieldPath, IndexId, IndexInvalidation, IndexManager, IndexStats};
