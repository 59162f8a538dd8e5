use std::cell::RefCell;
use std::rc::Weak;

use glam::Vec3;
use physworld_common::{BodyId, ConstraintId};
use physworld_kernel::{
    BackendError, DebugDraw, DebugDrawModes, DispatchInfo, DynamicsWorld, SolverInfo, StepStages,
    TypedConstraint,
};

use crate::body::Body;
use crate::broadphase::SweepAndPruneBroadphase;
use crate::constraint::DistanceConstraint;
use crate::dispatcher::{CollisionDispatcher, Contact};
use crate::shape::{Aabb, Shape};
use crate::solver::{JointRow, SequentialImpulseSolver};

const WIRE_COLOR: Vec3 = Vec3::new(1.0, 1.0, 1.0);
const AABB_COLOR: Vec3 = Vec3::new(1.0, 0.0, 0.0);
const CONTACT_COLOR: Vec3 = Vec3::new(1.0, 1.0, 0.0);
const CONSTRAINT_COLOR: Vec3 = Vec3::new(0.0, 1.0, 1.0);
const LIMIT_COLOR: Vec3 = Vec3::new(1.0, 0.0, 1.0);
const NORMAL_COLOR: Vec3 = Vec3::new(0.0, 0.0, 1.0);
const NORMAL_LENGTH: f32 = 0.5;
const CIRCLE_SEGMENTS: usize = 12;
const PLANE_DRAW_SIZE: f32 = 10.0;

/// Discrete dynamics world with fixed-step accumulation.
///
/// Bodies and constraints live in index-addressed arrays. Removal by index
/// hands ownership back to the caller.
pub struct DiscreteDynamicsWorld {
    bodies: Vec<Body>,
    constraints: Vec<DistanceConstraint>,
    contacts: Vec<Contact>,
    gravity: Vec3,
    dispatch_info: DispatchInfo,
    solver_info: SolverInfo,
    drawer: Option<Weak<RefCell<dyn DebugDraw>>>,
    /// Unsimulated time carried over between calls to `step_simulation`.
    local_time: f32,
}

impl Default for DiscreteDynamicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscreteDynamicsWorld {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            constraints: Vec::new(),
            contacts: Vec::new(),
            gravity: Vec3::new(0.0, -10.0, 0.0),
            dispatch_info: DispatchInfo::default(),
            solver_info: SolverInfo::default(),
            drawer: None,
            local_time: 0.0,
        }
    }

    /// Register a body. Its id must not already be present.
    pub fn add_rigid_body(&mut self, body: Body) -> Result<BodyId, BackendError> {
        let id = body.id();
        if self.body_index(id).is_some() {
            return Err(BackendError::DuplicateBody(id));
        }
        self.bodies.push(body);
        tracing::trace!(?id, bodies = self.bodies.len(), "body added");
        Ok(id)
    }

    /// Register a constraint between two distinct, already registered bodies.
    pub fn add_constraint(
        &mut self,
        constraint: DistanceConstraint,
    ) -> Result<ConstraintId, BackendError> {
        let (a, b) = constraint.bodies();
        if a == b {
            return Err(BackendError::SelfConstraint(a));
        }
        for id in [a, b] {
            if self.body_index(id).is_none() {
                return Err(BackendError::UnknownBody(id));
            }
        }
        let id = constraint.id();
        self.constraints.push(constraint);
        Ok(id)
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id() == id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id() == id)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn constraints(&self) -> &[DistanceConstraint] {
        &self.constraints
    }

    /// Contacts generated by the last internal step.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn local_time(&self) -> f32 {
        self.local_time
    }

    fn body_index(&self, id: BodyId) -> Option<usize> {
        self.bodies.iter().position(|b| b.id() == id)
    }

    fn joint_rows(&self) -> Vec<JointRow> {
        self.constraints
            .iter()
            .filter_map(|c| {
                let a = self.body_index(c.body_a)?;
                let b = self.body_index(c.body_b)?;
                Some(JointRow {
                    body_a: a,
                    body_b: b,
                    rest_length: c.rest_length,
                })
            })
            .collect()
    }

    fn apply_gravity_and_forces(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in &mut self.bodies {
            if !body.is_dynamic() {
                continue;
            }
            if let Some(rigid) = body.rigid_mut() {
                let acceleration = gravity + rigid.total_force * rigid.inverse_mass;
                rigid.linear_velocity += acceleration * dt;
            }
        }
    }

    fn integrate_positions(&mut self, dt: f32) {
        let use_continuous = self.dispatch_info.use_continuous;
        let planes: Vec<(Vec3, f32)> = if use_continuous {
            self.bodies
                .iter()
                .filter(|b| !b.is_dynamic())
                .filter_map(|b| match b.shape {
                    Shape::Plane { normal, constant } => Some((normal, constant)),
                    Shape::Sphere { .. } => None,
                })
                .collect()
        } else {
            Vec::new()
        };

        for body in &mut self.bodies {
            if !body.is_dynamic() {
                continue;
            }
            let start = body.position();
            let mut velocity = body.linear_velocity();
            let mut end = start + velocity * dt;

            if let Shape::Sphere { radius } = body.shape {
                for &(normal, constant) in &planes {
                    let before = normal.dot(start) - constant - radius;
                    let after = normal.dot(end) - constant - radius;
                    // Clamp to the time of impact instead of tunnelling through.
                    if before >= 0.0 && after < -radius {
                        let fraction = before / (before - after);
                        end = start + (end - start) * fraction;
                        velocity -= normal * velocity.dot(normal).min(0.0);
                        tracing::trace!(id = ?body.id(), fraction, "continuous collision clamp");
                    }
                }
            }

            body.transform.position = end;
            if let Some(rigid) = body.rigid_mut() {
                rigid.linear_velocity = velocity;
            }
        }
    }

    fn internal_single_step_simulation(
        &mut self,
        stages: &mut StepStages<'_, SweepAndPruneBroadphase, CollisionDispatcher, SequentialImpulseSolver>,
        dt: f32,
    ) {
        self.apply_gravity_and_forces(dt);

        let aabbs: Vec<Aabb> = self.bodies.iter().map(Body::aabb).collect();
        let pairs = stages.broadphase.calculate_overlapping_pairs(&aabbs);
        let contacts = stages
            .dispatcher
            .dispatch_all_collision_pairs(&self.bodies, pairs);

        self.contacts.clear();
        self.contacts.extend_from_slice(contacts);

        let joints = self.joint_rows();
        stages.solver.solve_group(
            &mut self.bodies,
            &self.contacts,
            &joints,
            &self.solver_info,
            dt,
        );

        self.integrate_positions(dt);
    }

    fn synchronize_motion_states(&mut self, interpolation: f32) {
        for body in &mut self.bodies {
            if body.is_dynamic() {
                body.sync_motion_state(interpolation);
            }
        }
    }

    fn clear_forces(&mut self) {
        for body in &mut self.bodies {
            if let Some(rigid) = body.rigid_mut() {
                rigid.total_force = Vec3::ZERO;
            }
        }
    }
}

impl DynamicsWorld for DiscreteDynamicsWorld {
    type Broadphase = SweepAndPruneBroadphase;
    type Dispatcher = CollisionDispatcher;
    type Solver = SequentialImpulseSolver;
    type Constraint = DistanceConstraint;
    type Object = Body;

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    fn dispatch_info(&self) -> &DispatchInfo {
        &self.dispatch_info
    }

    fn dispatch_info_mut(&mut self) -> &mut DispatchInfo {
        &mut self.dispatch_info
    }

    fn solver_info(&self) -> &SolverInfo {
        &self.solver_info
    }

    fn solver_info_mut(&mut self) -> &mut SolverInfo {
        &mut self.solver_info
    }

    fn set_debug_drawer(&mut self, drawer: Weak<RefCell<dyn DebugDraw>>) {
        self.drawer = Some(drawer);
    }

    fn step_simulation(
        &mut self,
        mut stages: StepStages<'_, SweepAndPruneBroadphase, CollisionDispatcher, SequentialImpulseSolver>,
        time_step: f32,
        max_sub_steps: i32,
        fixed_time_step: f32,
    ) -> u32 {
        let mut num_steps = 0u32;
        let mut max_steps = max_sub_steps;
        let mut fixed_time_step = fixed_time_step;

        if max_sub_steps != 0 {
            if fixed_time_step > 0.0 {
                self.local_time += time_step;
                if self.local_time >= fixed_time_step {
                    num_steps = (self.local_time / fixed_time_step) as u32;
                    self.local_time -= num_steps as f32 * fixed_time_step;
                }
            }
        } else {
            // Variable step: the whole delta in one update.
            fixed_time_step = time_step;
            self.local_time = 0.0;
            if time_step.abs() < f32::EPSILON {
                max_steps = 0;
            } else {
                num_steps = 1;
                max_steps = 1;
            }
        }

        let clamped = num_steps.min(max_steps.max(0) as u32);
        for _ in 0..clamped {
            self.internal_single_step_simulation(&mut stages, fixed_time_step);
        }
        if clamped < num_steps {
            tracing::trace!(num_steps, clamped, "substeps clamped");
        }

        self.synchronize_motion_states(self.local_time);
        self.clear_forces();
        num_steps
    }

    fn debug_draw_world(&mut self) {
        let Some(drawer) = self.drawer.as_ref().and_then(Weak::upgrade) else {
            return;
        };
        let mut drawer = drawer.borrow_mut();
        let mode = drawer.debug_mode();

        for body in &self.bodies {
            if mode.contains(DebugDrawModes::WIREFRAME) {
                draw_shape(&mut *drawer, body);
            }
            if mode.contains(DebugDrawModes::AABB) && body.is_dynamic() {
                for (from, to) in body.aabb().edges() {
                    drawer.draw_line(from, to, AABB_COLOR);
                }
            }
            if mode.contains(DebugDrawModes::FRAMES) && body.is_dynamic() {
                let origin = body.position();
                drawer.draw_line(origin, origin + Vec3::X, Vec3::X);
                drawer.draw_line(origin, origin + Vec3::Y, Vec3::Y);
                drawer.draw_line(origin, origin + Vec3::Z, Vec3::Z);
            }
        }

        if mode.contains(DebugDrawModes::CONTACT_POINTS) {
            for contact in &self.contacts {
                drawer.draw_contact_point(contact.point, contact.normal, contact.depth, CONTACT_COLOR);
            }
        }

        if mode.contains(DebugDrawModes::NORMALS) {
            for contact in &self.contacts {
                let tip = contact.point + contact.normal * NORMAL_LENGTH;
                drawer.draw_line(contact.point, tip, NORMAL_COLOR);
            }
        }

        for constraint in &self.constraints {
            let (Some(a), Some(b)) = (self.body(constraint.body_a), self.body(constraint.body_b))
            else {
                continue;
            };
            if mode.contains(DebugDrawModes::CONSTRAINTS) {
                drawer.draw_line(a.position(), b.position(), CONSTRAINT_COLOR);
            }
            // Rest length measured from body a towards body b.
            if mode.contains(DebugDrawModes::CONSTRAINT_LIMITS) {
                let axis = (b.position() - a.position()).normalize_or_zero();
                let rest = a.position() + axis * constraint.rest_length;
                drawer.draw_line(a.position(), rest, LIMIT_COLOR);
            }
        }
    }

    fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    fn remove_constraint(&mut self, index: usize) -> Option<DistanceConstraint> {
        (index < self.constraints.len()).then(|| self.constraints.remove(index))
    }

    fn num_collision_objects(&self) -> usize {
        self.bodies.len()
    }

    fn collision_object_mut(&mut self, index: usize) -> Option<&mut Body> {
        self.bodies.get_mut(index)
    }

    fn remove_collision_object(&mut self, index: usize) -> Option<Body> {
        if index >= self.bodies.len() {
            return None;
        }
        let body = self.bodies.remove(index);
        self.contacts.clear();
        Some(body)
    }
}

fn draw_shape(drawer: &mut dyn DebugDraw, body: &Body) {
    match body.shape {
        Shape::Sphere { radius } => {
            let center = body.position();
            for (u, v) in [(Vec3::X, Vec3::Y), (Vec3::Y, Vec3::Z), (Vec3::Z, Vec3::X)] {
                let point = |k: usize| {
                    let angle = k as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
                    center + (u * angle.cos() + v * angle.sin()) * radius
                };
                for k in 0..CIRCLE_SEGMENTS {
                    drawer.draw_line(point(k), point(k + 1), WIRE_COLOR);
                }
            }
        }
        Shape::Plane { normal, constant } => {
            let origin = normal * constant;
            let tangent = normal.any_orthonormal_vector();
            let bitangent = normal.cross(tangent);
            let corners = [
                origin + (tangent + bitangent) * PLANE_DRAW_SIZE,
                origin + (tangent - bitangent) * PLANE_DRAW_SIZE,
                origin - (tangent + bitangent) * PLANE_DRAW_SIZE,
                origin - (tangent - bitangent) * PLANE_DRAW_SIZE,
            ];
            for k in 0..corners.len() {
                drawer.draw_line(corners[k], corners[(k + 1) % corners.len()], WIRE_COLOR);
            }
            drawer.draw_line(origin, origin + normal, WIRE_COLOR);
        }
    }
}
