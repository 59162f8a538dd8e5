use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec3;

use crate::backend::{CollisionObject, DynamicsWorld, PhysicsBackend, StepStages};
use crate::config::SimulationConfig;
use crate::debug_draw::{DebugDraw, DebugDrawModes, DebugDrawSink, SharedDebugDraw};
use crate::environment::Environment;
use crate::error::{ConfigError, SimulationError};
use crate::plan::SubstepPlan;
use crate::signal::{NullSignalBus, Signal, SignalBus};

/// Sub-resources created by [`SimulationWorld::initialize`].
///
/// Fields drop in declaration order, which is the reverse of construction:
/// every resource may be referenced by those declared above it.
struct Resources<B: PhysicsBackend> {
    debug_draw: SharedDebugDraw,
    world: B::World,
    solver: B::Solver,
    dispatcher: B::Dispatcher,
    configuration: B::Configuration,
    broadphase: B::Broadphase,
}

impl<B: PhysicsBackend> Drop for Resources<B> {
    fn drop(&mut self) {
        tracing::info!(
            bodies = self.world.num_collision_objects(),
            constraints = self.world.num_constraints(),
            "releasing physics world"
        );
    }
}

/// Fixed-step physics driver.
///
/// Owns a dynamics world built from a [`PhysicsBackend`] and advances it by a
/// variable frame delta using a bounded number of fixed-size substeps.
///
/// Lifecycle: `new` → `initialize` → (`step` | `reset`)* → `teardown` or drop.
/// Every operation on an uninitialized world is a silent no-op.
pub struct SimulationWorld<B: PhysicsBackend> {
    resources: Option<Resources<B>>,
    backend: B,
    config: SimulationConfig,
    signals: Box<dyn SignalBus>,
    steps_taken: u64,
}

impl<B: PhysicsBackend> SimulationWorld<B> {
    /// Create an uninitialized world. No backend resources exist yet.
    pub fn new(backend: B, config: SimulationConfig) -> Self {
        Self {
            resources: None,
            backend,
            config,
            signals: Box::new(NullSignalBus),
            steps_taken: 0,
        }
    }

    /// Replace the signal bus that receives [`Signal::PhysicsStepped`].
    pub fn with_signal_bus(mut self, signals: impl SignalBus + 'static) -> Self {
        self.signals = Box::new(signals);
        self
    }

    /// Construct the sub-resources in dependency order and configure the world.
    ///
    /// Gravity comes from the stored config, continuous collision is enabled,
    /// split impulse is disabled, and a maximum-verbosity debug-draw sink is
    /// attached. On error nothing stays allocated.
    pub fn initialize(&mut self) -> Result<(), SimulationError> {
        if self.resources.is_some() {
            tracing::warn!("initialize called on an initialized simulation world");
            return Err(SimulationError::AlreadyInitialized);
        }
        self.config.validate()?;

        let broadphase = self.backend.create_broadphase()?;
        let configuration = self.backend.create_collision_configuration()?;
        let dispatcher = self.backend.create_dispatcher(&configuration)?;
        let solver = self.backend.create_constraint_solver()?;
        let mut world =
            self.backend
                .create_dynamics_world(&dispatcher, &broadphase, &solver, &configuration)?;
        let debug_draw = Rc::new(RefCell::new(DebugDrawSink::new(DebugDrawModes::MAX)));

        world.set_gravity(self.config.gravity);
        world.dispatch_info_mut().use_continuous = true;
        world.solver_info_mut().split_impulse = false;
        let drawer = Rc::downgrade(&debug_draw);
        let drawer: Weak<RefCell<dyn DebugDraw>> = drawer;
        world.set_debug_drawer(drawer);

        self.resources = Some(Resources {
            debug_draw,
            world,
            solver,
            dispatcher,
            configuration,
            broadphase,
        });

        tracing::info!(
            internal_frequency_hz = self.config.internal_frequency_hz,
            internal_step = self.config.internal_step(),
            max_sub_steps = self.config.max_sub_steps,
            gravity = ?self.config.gravity,
            "physics world initialized"
        );
        Ok(())
    }

    /// Advance the world by `delta_time` seconds of wall-clock time.
    ///
    /// Returns the number of internal steps actually simulated: the backend's
    /// required count bounded by the planned substep cap. While the
    /// environment is not running the debug-draw sink is refilled from the
    /// current state after stepping.
    pub fn step(&mut self, delta_time: f32, env: &dyn Environment) -> u32 {
        let Some(resources) = self.resources.as_mut() else {
            return 0;
        };
        let _span = tracing::info_span!("physics_step").entered();

        let delta_time = sanitize_delta(delta_time);
        let plan = SubstepPlan::compute(
            delta_time,
            self.config.internal_frequency_hz,
            self.config.max_sub_steps,
        );
        if plan.falls_behind() {
            tracing::debug!(
                delta_time,
                budget = plan.budgeted_time(),
                "substep cap reached, simulation falls behind real time"
            );
        }

        let Resources {
            debug_draw,
            world,
            solver,
            dispatcher,
            broadphase,
            ..
        } = resources;

        let required = world.step_simulation(
            StepStages {
                broadphase,
                dispatcher,
                solver,
            },
            plan.time_step,
            plan.max_sub_steps,
            plan.fixed_time_step,
        );
        let simulated = required.min(u32::try_from(plan.max_sub_steps).unwrap_or(0));
        self.steps_taken += 1;
        tracing::debug!(
            time_step = plan.time_step,
            max_sub_steps = plan.max_sub_steps,
            fixed_time_step = plan.fixed_time_step,
            required,
            simulated,
            "physics stepped"
        );

        self.signals.emit(Signal::PhysicsStepped);

        if !env.run_state().is_running() {
            debug_draw.borrow_mut().clear_lines();
            world.debug_draw_world();
            tracing::trace!(lines = debug_draw.borrow().line_count(), "debug draw refreshed");
        }

        simulated
    }

    /// Destroy every constraint and body in the world, keeping the world itself.
    ///
    /// Constraints go first so none outlives a body it references. Both arrays
    /// are walked from the highest index down; each item is unregistered
    /// before it is destroyed, and a rigid body's motion state is destroyed
    /// before the body.
    pub fn reset(&mut self) {
        let Some(resources) = self.resources.as_mut() else {
            return;
        };
        let world = &mut resources.world;

        let constraints = world.num_constraints();
        for index in (0..constraints).rev() {
            let constraint = world.remove_constraint(index);
            drop(constraint);
        }

        let bodies = world.num_collision_objects();
        for index in (0..bodies).rev() {
            if let Some(body) = world
                .collision_object_mut(index)
                .and_then(|object| object.as_rigid_body_mut())
            {
                drop(body.take_motion_state());
            }
            let object = world.remove_collision_object(index);
            drop(object);
        }

        tracing::info!(constraints, bodies, "physics world reset");
    }

    /// Release all sub-resources in reverse construction order.
    ///
    /// No-op when uninitialized. The world may be initialized again afterwards.
    pub fn teardown(&mut self) {
        if let Some(resources) = self.resources.take() {
            drop(resources);
        }
    }

    /// True between a successful `initialize` and the next `teardown`.
    pub fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    /// The configuration read by the next `initialize` or `step`.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Number of `step` calls that reached the backend.
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Update the stored gravity and, when initialized, the live world.
    ///
    /// A non-finite vector is rejected and the previous gravity kept.
    pub fn set_gravity(&mut self, gravity: Vec3) -> Result<(), ConfigError> {
        self.apply_config(SimulationConfig {
            gravity,
            ..self.config
        })?;
        if let Some(resources) = self.resources.as_mut() {
            resources.world.set_gravity(gravity);
        }
        Ok(())
    }

    /// Change the substep cap used from the next `step` on. Any value is valid.
    pub fn set_max_sub_steps(&mut self, max_sub_steps: i32) {
        self.config.max_sub_steps = max_sub_steps;
    }

    /// Change the internal update rate used from the next `step` on.
    ///
    /// Zero, negative and non-finite rates are rejected and the previous rate kept.
    pub fn set_internal_frequency_hz(
        &mut self,
        internal_frequency_hz: f32,
    ) -> Result<(), ConfigError> {
        self.apply_config(SimulationConfig {
            internal_frequency_hz,
            ..self.config
        })
    }

    fn apply_config(&mut self, candidate: SimulationConfig) -> Result<(), ConfigError> {
        if let Err(err) = candidate.validate() {
            tracing::warn!(%err, "configuration change rejected");
            return Err(err);
        }
        self.config = candidate;
        Ok(())
    }

    /// Non-owning view of the dynamics world.
    pub fn world(&self) -> Option<&B::World> {
        self.resources.as_ref().map(|r| &r.world)
    }

    /// Mutable view for body and constraint registration.
    pub fn world_mut(&mut self) -> Option<&mut B::World> {
        self.resources.as_mut().map(|r| &mut r.world)
    }

    /// The debug-draw sink. Cloning the handle shares ownership.
    pub fn debug_draw(&self) -> Option<&SharedDebugDraw> {
        self.resources.as_ref().map(|r| &r.debug_draw)
    }

    /// The collision configuration the dispatcher and world were built from.
    pub fn collision_configuration(&self) -> Option<&B::Configuration> {
        self.resources.as_ref().map(|r| &r.configuration)
    }

    /// The factory the sub-resources were built from.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

fn sanitize_delta(delta_time: f32) -> f32 {
    if delta_time.is_finite() && delta_time >= 0.0 {
        delta_time
    } else {
        tracing::warn!(delta_time, "invalid frame delta clamped to zero");
        0.0
    }
}
