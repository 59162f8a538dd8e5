//! Physics kernel: owns a dynamics world and advances it with fixed-size substeps.
//!
//! # Invariants
//! - Sub-resources are created in dependency order and released in exact reverse order.
//! - Every public operation on an uninitialized world is a silent no-op.
//! - A constraint is always unregistered from the world before it is destroyed,
//!   and constraints are destroyed before the bodies they reference.
//! - The substep count handed to the backend never exceeds a positive `max_sub_steps`.

pub mod backend;
pub mod config;
pub mod debug_draw;
pub mod environment;
pub mod error;
pub mod plan;
pub mod signal;
pub mod world;

pub use backend::{
    CollisionObject, DispatchInfo, DynamicsWorld, MotionState, PhysicsBackend, RigidBody,
    SolverInfo, StepStages, TypedConstraint,
};
pub use config::SimulationConfig;
pub use debug_draw::{DebugDraw, DebugDrawModes, DebugDrawSink, DebugLine, SharedDebugDraw};
pub use environment::{Environment, RunState};
pub use error::{BackendError, ConfigError, SimulationError};
pub use plan::SubstepPlan;
pub use signal::{ChannelSignalBus, NullSignalBus, Signal, SignalBus};
pub use world::SimulationWorld;
