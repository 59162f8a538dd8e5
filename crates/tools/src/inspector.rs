use glam::Vec3;
use physworld_backend::DiscreteDynamicsWorld;
use physworld_common::BodyId;
use physworld_kernel::{DynamicsWorld, PhysicsBackend, RigidBody, SimulationWorld};

/// Read-only queries against a simulation for debugging and CLI output.
pub struct WorldInspector;

impl WorldInspector {
    /// Produce a summary of the simulation state.
    pub fn summary<B: PhysicsBackend>(sim: &SimulationWorld<B>) -> WorldSummary {
        let config = sim.config();
        let world = sim.world();
        WorldSummary {
            initialized: sim.is_initialized(),
            body_count: world.map_or(0, |w| w.num_collision_objects()),
            constraint_count: world.map_or(0, |w| w.num_constraints()),
            gravity: world.map_or(config.gravity, |w| w.gravity()),
            internal_frequency_hz: config.internal_frequency_hz,
            max_sub_steps: config.max_sub_steps,
            debug_line_count: sim.debug_draw().map_or(0, |d| d.borrow().line_count()),
            steps_taken: sim.steps_taken(),
        }
    }

    /// Pose and velocity of one body in the reference world, plus the
    /// interpolated position its motion state last received.
    pub fn inspect_body(world: &DiscreteDynamicsWorld, id: BodyId) -> Option<BodyInfo> {
        world.body(id).map(|body| BodyInfo {
            id,
            position: body.position(),
            interpolated: body
                .rigid()
                .and_then(|rigid| rigid.motion_state())
                .map(|state| state.world_transform().position),
            linear_velocity: body.linear_velocity(),
            dynamic: body.is_dynamic(),
        })
    }

    /// List all body ids in registration order.
    pub fn list_bodies(world: &DiscreteDynamicsWorld) -> Vec<BodyId> {
        world.bodies().iter().map(|b| b.id()).collect()
    }
}

/// Snapshot of simulation state for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSummary {
    pub initialized: bool,
    pub body_count: usize,
    pub constraint_count: usize,
    pub gravity: Vec3,
    pub internal_frequency_hz: f32,
    pub max_sub_steps: i32,
    pub debug_line_count: usize,
    pub steps_taken: u64,
}

impl std::fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Simulation: initialized={} bodies={} constraints={} gravity=({:.2}, {:.2}, {:.2}) \
             hz={} max_sub_steps={} debug_lines={} steps={}",
            self.initialized,
            self.body_count,
            self.constraint_count,
            self.gravity.x,
            self.gravity.y,
            self.gravity.z,
            self.internal_frequency_hz,
            self.max_sub_steps,
            self.debug_line_count,
            self.steps_taken
        )
    }
}

/// Detailed info about a single body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyInfo {
    pub id: BodyId,
    pub position: Vec3,
    pub interpolated: Option<Vec3>,
    pub linear_velocity: Vec3,
    pub dynamic: bool,
}

impl std::fmt::Display for BodyInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Body [{:.8}] pos=({:.2}, {:.2}, {:.2}) vel=({:.2}, {:.2}, {:.2}){}",
            &self.id.0.to_string()[..8],
            self.position.x,
            self.position.y,
            self.position.z,
            self.linear_velocity.x,
            self.linear_velocity.y,
            self.linear_velocity.z,
            if self.dynamic { "" } else { " static" }
        )?;
        if let Some(p) = self.interpolated {
            write!(f, " interp=({:.2}, {:.2}, {:.2})", p.x, p.y, p.z)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physworld_backend::{Body, DefaultMotionState, ReferenceBackend, Shape};
    use physworld_common::Transform;
    use physworld_kernel::{RunState, SimulationConfig};

    fn sim() -> SimulationWorld<ReferenceBackend> {
        SimulationWorld::new(ReferenceBackend::default(), SimulationConfig::default())
    }

    #[test]
    fn summary_uninitialized() {
        let summary = WorldInspector::summary(&sim());
        assert!(!summary.initialized);
        assert_eq!(summary.body_count, 0);
        assert_eq!(summary.gravity, Vec3::new(0.0, -9.81, 0.0));
    }

    #[test]
    fn summary_counts_bodies_and_steps() {
        let mut sim = sim();
        sim.initialize().unwrap();
        let world = sim.world_mut().unwrap();
        world
            .add_rigid_body(Body::new_static(Shape::plane(Vec3::Y, 0.0), Transform::default()))
            .unwrap();
        world
            .add_rigid_body(Body::new_rigid(Shape::sphere(0.5), 1.0, Transform::default()))
            .unwrap();
        sim.step(1.0 / 60.0, &RunState::Stopped);

        let summary = WorldInspector::summary(&sim);
        assert!(summary.initialized);
        assert_eq!(summary.body_count, 2);
        assert_eq!(summary.constraint_count, 0);
        assert_eq!(summary.steps_taken, 1);
        assert!(summary.debug_line_count > 0);
    }

    #[test]
    fn inspect_body_found_and_missing() {
        let mut sim = sim();
        sim.initialize().unwrap();
        let world = sim.world_mut().unwrap();
        let id = world
            .add_rigid_body(Body::new_rigid(
                Shape::sphere(0.5),
                1.0,
                Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
            ))
            .unwrap();

        let world = sim.world().unwrap();
        let info = WorldInspector::inspect_body(world, id).unwrap();
        assert_eq!(info.position, Vec3::new(1.0, 2.0, 3.0));
        assert!(info.dynamic);
        assert!(WorldInspector::inspect_body(world, BodyId::new()).is_none());
        assert_eq!(WorldInspector::list_bodies(world), vec![id]);
    }

    #[test]
    fn inspect_body_reports_motion_state_pose() {
        let config = SimulationConfig {
            gravity: Vec3::ZERO,
            ..Default::default()
        };
        let mut sim = SimulationWorld::new(ReferenceBackend::default(), config);
        sim.initialize().unwrap();
        let world = sim.world_mut().unwrap();
        let tracked = world
            .add_rigid_body(
                Body::new_rigid(Shape::sphere(0.5), 1.0, Transform::default())
                    .with_motion_state(Box::new(DefaultMotionState::default()))
                    .with_velocity(Vec3::X),
            )
            .unwrap();
        let plain = world
            .add_rigid_body(Body::new_rigid(
                Shape::sphere(0.5),
                1.0,
                Transform::from_position(Vec3::new(5.0, 0.0, 0.0)),
            ))
            .unwrap();

        // Half an internal step: nothing simulated, the pose is extrapolated.
        sim.step(0.5 / 60.0, &RunState::Running);

        let world = sim.world().unwrap();
        let info = WorldInspector::inspect_body(world, tracked).unwrap();
        assert_eq!(info.position, Vec3::ZERO);
        let interpolated = info.interpolated.unwrap();
        assert!((interpolated.x - 0.5 / 60.0).abs() < 1e-5, "x = {}", interpolated.x);
        assert!(format!("{info}").contains("interp="));

        let info = WorldInspector::inspect_body(world, plain).unwrap();
        assert!(info.interpolated.is_none());
        assert!(!format!("{info}").contains("interp="));
    }

    #[test]
    fn summary_display() {
        let s = format!("{}", WorldInspector::summary(&sim()));
        assert!(s.contains("initialized=false"));
        assert!(s.contains("steps=0"));
    }
}
