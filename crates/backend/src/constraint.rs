use physworld_common::{BodyId, ConstraintId};
use physworld_kernel::TypedConstraint;

/// Keeps two body centers at a fixed distance.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceConstraint {
    id: ConstraintId,
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub rest_length: f32,
}

impl DistanceConstraint {
    pub fn new(body_a: BodyId, body_b: BodyId, rest_length: f32) -> Self {
        Self {
            id: ConstraintId::new(),
            body_a,
            body_b,
            rest_length: rest_length.max(0.0),
        }
    }
}

impl TypedConstraint for DistanceConstraint {
    fn id(&self) -> ConstraintId {
        self.id
    }

    fn bodies(&self) -> (BodyId, BodyId) {
        (self.body_a, self.body_b)
    }
}
