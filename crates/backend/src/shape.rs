use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Half-extent used for the bounding box of unbounded shapes.
pub const PLANE_EXTENT: f32 = 1.0e4;

/// Collision geometry supported by the reference backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { radius: f32 },
    /// Infinite plane `normal · x = constant`, expressed in world space.
    Plane { normal: Vec3, constant: f32 },
}

impl Shape {
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Plane through the origin offset by `constant` along the normalized `normal`.
    pub fn plane(normal: Vec3, constant: f32) -> Self {
        let normal = normal.normalize_or_zero();
        Self::Plane {
            normal: if normal == Vec3::ZERO { Vec3::Y } else { normal },
            constant,
        }
    }

    pub fn aabb(&self, position: Vec3) -> Aabb {
        match *self {
            Self::Sphere { radius } => Aabb {
                min: position - Vec3::splat(radius),
                max: position + Vec3::splat(radius),
            },
            Self::Plane { .. } => Aabb {
                min: Vec3::splat(-PLANE_EXTENT),
                max: Vec3::splat(PLANE_EXTENT),
            },
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// The twelve edges as line segments.
    pub fn edges(&self) -> [(Vec3, Vec3); 12] {
        let (a, b) = (self.min, self.max);
        let c = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
        [
            (c(a.x, a.y, a.z), c(b.x, a.y, a.z)),
            (c(a.x, b.y, a.z), c(b.x, b.y, a.z)),
            (c(a.x, a.y, b.z), c(b.x, a.y, b.z)),
            (c(a.x, b.y, b.z), c(b.x, b.y, b.z)),
            (c(a.x, a.y, a.z), c(a.x, b.y, a.z)),
            (c(b.x, a.y, a.z), c(b.x, b.y, a.z)),
            (c(a.x, a.y, b.z), c(a.x, b.y, b.z)),
            (c(b.x, a.y, b.z), c(b.x, b.y, b.z)),
            (c(a.x, a.y, a.z), c(a.x, a.y, b.z)),
            (c(b.x, a.y, a.z), c(b.x, a.y, b.z)),
            (c(a.x, b.y, a.z), c(a.x, b.y, b.z)),
            (c(b.x, b.y, a.z), c(b.x, b.y, b.z)),
        ]
    }
}
