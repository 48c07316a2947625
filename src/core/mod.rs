//! # Query Core
//!
//! Wires the store, index cache, planner and executor into one context.
//!
//! ## Design Principles
//!
//! - One context owns the store and its index cache
//! - Every query goes plan, then execute
//! - Failures are counted and logged once, here

pub mod config;
pub mod context;
pub mod error;

pub use config::QueryConfig;
pub use context::QueryContext;
pub use error::{CoreError, CoreResult};
