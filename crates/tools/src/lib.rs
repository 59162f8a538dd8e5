//! Developer tooling: read-only inspection of a running simulation.
//!
//! # Invariants
//! - Inspection never mutates the simulation.

mod inspector;

pub use inspector::{BodyInfo, WorldInspector, WorldSummary};
