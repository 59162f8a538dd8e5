//! Collaborator contract for physics backends.
//!
//! The kernel never creates bodies or constraints itself. It constructs the
//! four sub-resources through a [`PhysicsBackend`], drives the resulting
//! [`DynamicsWorld`], and destroys whatever the world's registries hold.

use std::cell::RefCell;
use std::rc::Weak;

use glam::Vec3;
use physworld_common::{BodyId, ConstraintId, Transform};

use crate::debug_draw::DebugDraw;
use crate::error::BackendError;

/// Per-body record keeping the simulated pose in sync with an external representation.
pub trait MotionState {
    fn world_transform(&self) -> Transform;
    fn set_world_transform(&mut self, transform: Transform);
}

/// Dynamic body view of a collision object.
pub trait RigidBody {
    fn motion_state(&self) -> Option<&dyn MotionState>;

    /// Detach the motion state, handing ownership to the caller.
    fn take_motion_state(&mut self) -> Option<Box<dyn MotionState>>;
}

/// Anything registered in the world's collision-object array.
pub trait CollisionObject {
    fn id(&self) -> BodyId;

    /// Upcast to a rigid body; static colliders return `None`.
    fn as_rigid_body_mut(&mut self) -> Option<&mut dyn RigidBody> {
        None
    }
}

/// Joint or limit between exactly two registered bodies.
pub trait TypedConstraint {
    fn id(&self) -> ConstraintId;
    fn bodies(&self) -> (BodyId, BodyId);
}

/// Narrowphase dispatch options.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DispatchInfo {
    /// Continuous collision detection against tunnelling.
    pub use_continuous: bool,
}

/// Constraint solver options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverInfo {
    /// Resolve penetration with a separate position-only impulse.
    pub split_impulse: bool,
    pub num_iterations: u32,
    /// Baumgarte factor for penetration recovery.
    pub erp: f32,
}

impl Default for SolverInfo {
    fn default() -> Self {
        Self {
            split_impulse: true,
            num_iterations: 10,
            erp: 0.2,
        }
    }
}

/// Mutable borrows of the sub-resources a world needs while stepping.
///
/// The world never stores references to its broadphase, dispatcher or solver;
/// the owner lends them for the duration of one `step_simulation` call.
pub struct StepStages<'a, P, D, S> {
    pub broadphase: &'a mut P,
    pub dispatcher: &'a mut D,
    pub solver: &'a mut S,
}

/// Aggregate simulation state: bodies, constraints, gravity and solver settings.
pub trait DynamicsWorld {
    type Broadphase;
    type Dispatcher;
    type Solver;
    type Constraint: TypedConstraint;
    type Object: CollisionObject;

    fn gravity(&self) -> Vec3;
    fn set_gravity(&mut self, gravity: Vec3);

    fn dispatch_info(&self) -> &DispatchInfo;
    fn dispatch_info_mut(&mut self) -> &mut DispatchInfo;
    fn solver_info(&self) -> &SolverInfo;
    fn solver_info_mut(&mut self) -> &mut SolverInfo;

    /// Attach a non-owning debug drawer used by [`DynamicsWorld::debug_draw_world`].
    fn set_debug_drawer(&mut self, drawer: Weak<RefCell<dyn DebugDraw>>);

    /// Consume `time_step` seconds in up to `max_sub_steps` updates of
    /// `fixed_time_step`. Returns the number of internal steps required.
    fn step_simulation(
        &mut self,
        stages: StepStages<'_, Self::Broadphase, Self::Dispatcher, Self::Solver>,
        time_step: f32,
        max_sub_steps: i32,
        fixed_time_step: f32,
    ) -> u32;

    /// Emit draw commands for the current state into the attached drawer.
    fn debug_draw_world(&mut self);

    fn num_constraints(&self) -> usize;
    /// Unregister the constraint at `index`, handing ownership to the caller.
    fn remove_constraint(&mut self, index: usize) -> Option<Self::Constraint>;

    fn num_collision_objects(&self) -> usize;
    fn collision_object_mut(&mut self, index: usize) -> Option<&mut Self::Object>;
    /// Unregister the object at `index`, handing ownership to the caller.
    fn remove_collision_object(&mut self, index: usize) -> Option<Self::Object>;
}

/// Factory for the simulation's sub-resources.
///
/// Constructors receive the resources they depend on by reference; the
/// kernel keeps ownership of every returned value.
pub trait PhysicsBackend {
    type Broadphase;
    type Configuration;
    type Dispatcher;
    type Solver;
    type World: DynamicsWorld<
            Broadphase = Self::Broadphase,
            Dispatcher = Self::Dispatcher,
            Solver = Self::Solver,
        >;

    fn create_broadphase(&self) -> Result<Self::Broadphase, BackendError>;
    fn create_collision_configuration(&self) -> Result<Self::Configuration, BackendError>;
    fn create_dispatcher(
        &self,
        configuration: &Self::Configuration,
    ) -> Result<Self::Dispatcher, BackendError>;
    fn create_constraint_solver(&self) -> Result<Self::Solver, BackendError>;
    fn create_dynamics_world(
        &self,
        dispatcher: &Self::Dispatcher,
        broadphase: &Self::Broadphase,
        solver: &Self::Solver,
        configuration: &Self::Configuration,
    ) -> Result<Self::World, BackendError>;
}
