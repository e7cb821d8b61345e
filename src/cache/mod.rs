//! In-memory caching primitives.
//!
//! This module provides the building blocks the config store uses:
//! - `SingleFlight`: a keyed map of shared computations with at most one
//!   fetch in flight per key
//! - `Pending`: the cloneable, replayable handle callers await
//! - `Document`: a cached JSON value that can be edited in place

mod layer;
mod traits;

pub use layer::SingleFlight;
pub use traits::{document, Document, Pending};
