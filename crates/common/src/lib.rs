//! Shared value types for the physworld crates.
//!
//! # Invariants
//! - Identifiers are globally unique (uuid v4) and never reused.

mod types;

pub use types::{BodyId, ConstraintId, Transform};
