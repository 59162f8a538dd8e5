use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use physworld_common::{BodyId, Transform};
use physworld_kernel::{CollisionObject, MotionState, RigidBody};

use crate::shape::{Aabb, Shape};

/// Motion state that simply stores the last pose it was given.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DefaultMotionState {
    transform: Transform,
}

impl DefaultMotionState {
    pub fn new(transform: Transform) -> Self {
        Self { transform }
    }
}

impl MotionState for DefaultMotionState {
    fn world_transform(&self) -> Transform {
        self.transform
    }

    fn set_world_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }
}

/// Motion state writing into a transform shared with an external representation,
/// e.g. a renderable.
#[derive(Debug, Clone, Default)]
pub struct LinkedMotionState(pub Rc<RefCell<Transform>>);

impl MotionState for LinkedMotionState {
    fn world_transform(&self) -> Transform {
        *self.0.borrow()
    }

    fn set_world_transform(&mut self, transform: Transform) {
        *self.0.borrow_mut() = transform;
    }
}

/// Dynamic part of a body. Linear dynamics only.
pub struct RigidState {
    pub inverse_mass: f32,
    pub linear_velocity: Vec3,
    pub total_force: Vec3,
    pub restitution: f32,
    motion_state: Option<Box<dyn MotionState>>,
}

impl std::fmt::Debug for RigidState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigidState")
            .field("inverse_mass", &self.inverse_mass)
            .field("linear_velocity", &self.linear_velocity)
            .field("total_force", &self.total_force)
            .field("restitution", &self.restitution)
            .field("has_motion_state", &self.motion_state.is_some())
            .finish()
    }
}

impl RigidBody for RigidState {
    fn motion_state(&self) -> Option<&dyn MotionState> {
        self.motion_state.as_deref()
    }

    fn take_motion_state(&mut self) -> Option<Box<dyn MotionState>> {
        self.motion_state.take()
    }
}

/// A collision object registered in a [`crate::DiscreteDynamicsWorld`].
///
/// Static colliders carry no [`RigidState`]. A rigid body with zero mass is
/// immovable, like a static one.
#[derive(Debug)]
pub struct Body {
    id: BodyId,
    pub shape: Shape,
    pub transform: Transform,
    rigid: Option<RigidState>,
}

impl Body {
    pub fn new_static(shape: Shape, transform: Transform) -> Self {
        Self {
            id: BodyId::new(),
            shape,
            transform,
            rigid: None,
        }
    }

    pub fn new_rigid(shape: Shape, mass: f32, transform: Transform) -> Self {
        let inverse_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        Self {
            id: BodyId::new(),
            shape,
            transform,
            rigid: Some(RigidState {
                inverse_mass,
                linear_velocity: Vec3::ZERO,
                total_force: Vec3::ZERO,
                restitution: 0.0,
                motion_state: None,
            }),
        }
    }

    /// Attach a motion state; the body starts at the pose it reports.
    /// Ignored for static bodies.
    pub fn with_motion_state(mut self, motion_state: Box<dyn MotionState>) -> Self {
        if let Some(rigid) = self.rigid.as_mut() {
            self.transform = motion_state.world_transform();
            rigid.motion_state = Some(motion_state);
        }
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        if let Some(rigid) = self.rigid.as_mut() {
            rigid.linear_velocity = velocity;
        }
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        if let Some(rigid) = self.rigid.as_mut() {
            rigid.restitution = restitution.clamp(0.0, 1.0);
        }
        self
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn rigid(&self) -> Option<&RigidState> {
        self.rigid.as_ref()
    }

    pub fn rigid_mut(&mut self) -> Option<&mut RigidState> {
        self.rigid.as_mut()
    }

    pub fn inverse_mass(&self) -> f32 {
        self.rigid.as_ref().map_or(0.0, |r| r.inverse_mass)
    }

    /// True when the solver may move this body.
    pub fn is_dynamic(&self) -> bool {
        self.inverse_mass() > 0.0
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.rigid.as_ref().map_or(Vec3::ZERO, |r| r.linear_velocity)
    }

    pub fn restitution(&self) -> f32 {
        self.rigid.as_ref().map_or(0.0, |r| r.restitution)
    }

    pub fn apply_central_force(&mut self, force: Vec3) {
        if let Some(rigid) = self.rigid.as_mut() {
            rigid.total_force += force;
        }
    }

    /// Change velocity by `impulse * inverse_mass`.
    pub fn apply_central_impulse(&mut self, impulse: Vec3) {
        if let Some(rigid) = self.rigid.as_mut() {
            rigid.linear_velocity += impulse * rigid.inverse_mass;
        }
    }

    pub fn aabb(&self) -> Aabb {
        self.shape.aabb(self.transform.position)
    }

    /// Push the simulated pose, offset by `interpolation` seconds of motion, into the motion state.
    pub(crate) fn sync_motion_state(&mut self, interpolation: f32) {
        let position = self.transform.position;
        let Some(rigid) = self.rigid.as_mut() else {
            return;
        };
        let velocity = rigid.linear_velocity;
        if let Some(motion_state) = rigid.motion_state.as_mut() {
            motion_state.set_world_transform(Transform {
                position: position + velocity * interpolation,
                ..self.transform
            });
        }
    }
}

impl CollisionObject for Body {
    fn id(&self) -> BodyId {
        self.id
    }

    fn as_rigid_body_mut(&mut self) -> Option<&mut dyn RigidBody> {
        self.rigid.as_mut().map(|r| r as &mut dyn RigidBody)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_mass_rigid_body_is_immovable() {
        let mut body = Body::new_rigid(Shape::sphere(1.0), 0.0, Transform::default());
        assert!(!body.is_dynamic());
        body.apply_central_impulse(Vec3::X);
        assert_eq!(body.linear_velocity(), Vec3::ZERO);
    }

    #[test]
    fn impulse_scales_by_inverse_mass() {
        let mut body = Body::new_rigid(Shape::sphere(1.0), 2.0, Transform::default());
        body.apply_central_impulse(Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(body.linear_velocity(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn motion_state_sets_initial_pose() {
        let start = Transform::from_position(Vec3::new(0.0, 5.0, 0.0));
        let body = Body::new_rigid(Shape::sphere(0.5), 1.0, Transform::default())
            .with_motion_state(Box::new(DefaultMotionState::new(start)));
        assert_eq!(body.position(), Vec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn static_body_has_no_rigid_view() {
        let mut body = Body::new_static(Shape::plane(Vec3::Y, 0.0), Transform::default())
            .with_motion_state(Box::new(DefaultMotionState::default()));
        assert!(body.as_rigid_body_mut().is_none());
        assert_eq!(body.restitution(), 0.0);
    }

    #[test]
    fn linked_motion_state_mirrors_sync() {
        let shared = Rc::new(RefCell::new(Transform::default()));
        let mut body = Body::new_rigid(Shape::sphere(0.5), 1.0, Transform::default())
            .with_motion_state(Box::new(LinkedMotionState(shared.clone())))
            .with_velocity(Vec3::new(2.0, 0.0, 0.0));
        body.transform.position = Vec3::new(1.0, 0.0, 0.0);

        body.sync_motion_state(0.5);

        assert_eq!(shared.borrow().position, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn take_motion_state_detaches_it() {
        let mut body = Body::new_rigid(Shape::sphere(0.5), 1.0, Transform::default())
            .with_motion_state(Box::new(DefaultMotionState::default()));
        let rigid = body.as_rigid_body_mut().unwrap();
        assert!(rigid.take_motion_state().is_some());
        assert!(rigid.motion_state().is_none());
    }
}
