//! Reference physics backend for the simulation kernel.
//!
//! Spheres and world-space planes, linear dynamics only. Good enough to
//! exercise every path of [`physworld_kernel::SimulationWorld`]: substep
//! accumulation, contact solving with and without split impulse,
//! continuous collision against planes, and debug drawing.

mod body;
mod broadphase;
mod configuration;
mod constraint;
mod dispatcher;
mod shape;
mod solver;
mod world;

pub use body::{Body, DefaultMotionState, LinkedMotionState, RigidState};
pub use broadphase::SweepAndPruneBroadphase;
pub use configuration::DefaultCollisionConfiguration;
pub use constraint::DistanceConstraint;
pub use dispatcher::{CollisionDispatcher, Contact};
pub use shape::{Aabb, Shape, PLANE_EXTENT};
pub use solver::{JointRow, SequentialImpulseSolver};
pub use world::DiscreteDynamicsWorld;

use physworld_kernel::{BackendError, DynamicsWorld, PhysicsBackend};
use serde::{Deserialize, Serialize};

/// Tuning knobs for the reference backend's sub-resources.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Fattening applied to every bounding box before pair search.
    pub broadphase_margin: f32,
    pub contact_breaking_threshold: f32,
    pub max_contacts: usize,
    pub solver_iterations: u32,
    pub linear_slop: f32,
}

impl Default for BackendSettings {
    fn default() -> Self {
        let collision = DefaultCollisionConfiguration::default();
        Self {
            broadphase_margin: 0.04,
            contact_breaking_threshold: collision.contact_breaking_threshold,
            max_contacts: collision.max_contacts,
            solver_iterations: 10,
            linear_slop: 0.005,
        }
    }
}

fn non_negative(resource: &'static str, name: &str, value: f32) -> Result<(), BackendError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(BackendError::Construction {
            resource,
            reason: format!("{name} must be finite and non-negative, got {value}"),
        })
    }
}

/// Factory for the reference sub-resources.
#[derive(Debug, Clone, Default)]
pub struct ReferenceBackend {
    settings: BackendSettings,
}

impl ReferenceBackend {
    pub fn new(settings: BackendSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }
}

impl PhysicsBackend for ReferenceBackend {
    type Broadphase = SweepAndPruneBroadphase;
    type Configuration = DefaultCollisionConfiguration;
    type Dispatcher = CollisionDispatcher;
    type Solver = SequentialImpulseSolver;
    type World = DiscreteDynamicsWorld;

    fn create_broadphase(&self) -> Result<SweepAndPruneBroadphase, BackendError> {
        non_negative("broadphase", "margin", self.settings.broadphase_margin)?;
        Ok(SweepAndPruneBroadphase::new(self.settings.broadphase_margin))
    }

    fn create_collision_configuration(
        &self,
    ) -> Result<DefaultCollisionConfiguration, BackendError> {
        non_negative(
            "collision configuration",
            "contact breaking threshold",
            self.settings.contact_breaking_threshold,
        )?;
        if self.settings.max_contacts == 0 {
            return Err(BackendError::Construction {
                resource: "collision configuration",
                reason: "contact pool must hold at least one contact".to_owned(),
            });
        }
        Ok(DefaultCollisionConfiguration {
            contact_breaking_threshold: self.settings.contact_breaking_threshold,
            max_contacts: self.settings.max_contacts,
        })
    }

    fn create_dispatcher(
        &self,
        configuration: &DefaultCollisionConfiguration,
    ) -> Result<CollisionDispatcher, BackendError> {
        Ok(CollisionDispatcher::new(configuration))
    }

    fn create_constraint_solver(&self) -> Result<SequentialImpulseSolver, BackendError> {
        non_negative("constraint solver", "linear slop", self.settings.linear_slop)?;
        if self.settings.solver_iterations == 0 {
            return Err(BackendError::Construction {
                resource: "constraint solver",
                reason: "at least one solver iteration is required".to_owned(),
            });
        }
        Ok(SequentialImpulseSolver::new(self.settings.linear_slop))
    }

    fn create_dynamics_world(
        &self,
        _dispatcher: &CollisionDispatcher,
        _broadphase: &SweepAndPruneBroadphase,
        _solver: &SequentialImpulseSolver,
        _configuration: &DefaultCollisionConfiguration,
    ) -> Result<DiscreteDynamicsWorld, BackendError> {
        let mut world = DiscreteDynamicsWorld::new();
        world.solver_info_mut().num_iterations = self.settings.solver_iterations;
        tracing::debug!(settings = ?self.settings, "reference dynamics world created");
        Ok(world)
    }
}
