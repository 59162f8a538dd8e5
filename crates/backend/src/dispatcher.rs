use glam::Vec3;

use crate::body::Body;
use crate::configuration::DefaultCollisionConfiguration;
use crate::shape::Shape;

/// A contact between two bodies, indexed into the world's body array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub body_a: usize,
    pub body_b: usize,
    /// Unit normal pointing from `body_a` towards `body_b`.
    pub normal: Vec3,
    /// Penetration depth; negative for a speculative contact that is still separated.
    pub depth: f32,
    /// World-space contact point on the surface of `body_b`.
    pub point: Vec3,
}

/// Narrowphase: turns broadphase candidate pairs into contacts.
///
/// Supports sphere/sphere and sphere/plane. Pairs where neither body can
/// move are skipped.
#[derive(Debug, Clone)]
pub struct CollisionDispatcher {
    contact_breaking_threshold: f32,
    max_contacts: usize,
    contacts: Vec<Contact>,
}

impl CollisionDispatcher {
    pub fn new(configuration: &DefaultCollisionConfiguration) -> Self {
        Self {
            contact_breaking_threshold: configuration.contact_breaking_threshold,
            max_contacts: configuration.max_contacts,
            contacts: Vec::with_capacity(configuration.max_contacts.min(256)),
        }
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn needs_collision(a: &Body, b: &Body) -> bool {
        a.is_dynamic() || b.is_dynamic()
    }

    pub fn dispatch_all_collision_pairs(
        &mut self,
        bodies: &[Body],
        pairs: &[(usize, usize)],
    ) -> &[Contact] {
        self.contacts.clear();
        let mut dropped = 0usize;

        for &(i, j) in pairs {
            let (a, b) = (&bodies[i], &bodies[j]);
            if !Self::needs_collision(a, b) {
                continue;
            }
            let Some(contact) = self.collide(i, a, j, b) else {
                continue;
            };
            if self.contacts.len() < self.max_contacts {
                self.contacts.push(contact);
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            tracing::warn!(dropped, max = self.max_contacts, "contact pool exhausted");
        }
        &self.contacts
    }

    fn collide(&self, i: usize, a: &Body, j: usize, b: &Body) -> Option<Contact> {
        let (normal, depth, point) = match (a.shape, b.shape) {
            (Shape::Sphere { radius: ra }, Shape::Sphere { radius: rb }) => {
                sphere_sphere(a.position(), ra, b.position(), rb)
            }
            (Shape::Sphere { radius }, Shape::Plane { normal, constant }) => {
                sphere_plane(a.position(), radius, normal, constant)
            }
            (Shape::Plane { normal, constant }, Shape::Sphere { radius }) => {
                let (_, depth, _) = sphere_plane(b.position(), radius, normal, constant);
                (normal, depth, b.position() - normal * radius)
            }
            (Shape::Plane { .. }, Shape::Plane { .. }) => return None,
        };

        (depth > -self.contact_breaking_threshold).then_some(Contact {
            body_a: i,
            body_b: j,
            normal,
            depth,
            point,
        })
    }
}

/// Returns `(normal a→b, depth, point on b)`.
fn sphere_sphere(pa: Vec3, ra: f32, pb: Vec3, rb: f32) -> (Vec3, f32, Vec3) {
    let delta = pb - pa;
    let distance = delta.length();
    let normal = if distance > f32::EPSILON {
        delta / distance
    } else {
        Vec3::Y
    };
    (normal, ra + rb - distance, pb - normal * rb)
}

/// Sphere as body a, plane as body b. Returns `(normal sphere→plane, depth, point on plane)`.
fn sphere_plane(center: Vec3, radius: f32, normal: Vec3, constant: f32) -> (Vec3, f32, Vec3) {
    let signed = normal.dot(center) - constant;
    (-normal, radius - signed, center - normal * signed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use physworld_common::Transform;

    fn sphere_at(position: Vec3, radius: f32) -> Body {
        Body::new_rigid(Shape::sphere(radius), 1.0, Transform::from_position(position))
    }

    fn ground() -> Body {
        Body::new_static(Shape::plane(Vec3::Y, 0.0), Transform::default())
    }

    fn dispatcher() -> CollisionDispatcher {
        CollisionDispatcher::new(&DefaultCollisionConfiguration::default())
    }

    #[test]
    fn overlapping_spheres_produce_contact() {
        let bodies = [sphere_at(Vec3::ZERO, 1.0), sphere_at(Vec3::new(1.5, 0.0, 0.0), 1.0)];
        let mut d = dispatcher();
        let contacts = d.dispatch_all_collision_pairs(&bodies, &[(0, 1)]);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].normal, Vec3::X);
        assert!((contacts[0].depth - 0.5).abs() < 1e-6);
        assert_eq!(contacts[0].point, Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn distant_spheres_produce_nothing() {
        let bodies = [sphere_at(Vec3::ZERO, 1.0), sphere_at(Vec3::new(3.0, 0.0, 0.0), 1.0)];
        let mut d = dispatcher();
        assert!(d.dispatch_all_collision_pairs(&bodies, &[(0, 1)]).is_empty());
    }

    #[test]
    fn near_spheres_produce_speculative_contact() {
        let bodies = [sphere_at(Vec3::ZERO, 1.0), sphere_at(Vec3::new(2.01, 0.0, 0.0), 1.0)];
        let mut d = dispatcher();
        let contacts = d.dispatch_all_collision_pairs(&bodies, &[(0, 1)]);
        assert_eq!(contacts.len(), 1);
        assert!(contacts[0].depth < 0.0);
    }

    #[test]
    fn plane_normal_points_from_a_to_b() {
        let bodies = [ground(), sphere_at(Vec3::new(0.0, 0.4, 0.0), 0.5)];
        let mut d = dispatcher();
        let contacts = d.dispatch_all_collision_pairs(&bodies, &[(0, 1)]).to_vec();
        assert_eq!(contacts[0].normal, Vec3::Y);
        assert!((contacts[0].depth - 0.1).abs() < 1e-6);

        let bodies = [sphere_at(Vec3::new(0.0, 0.4, 0.0), 0.5), ground()];
        let contacts = d.dispatch_all_collision_pairs(&bodies, &[(0, 1)]);
        assert_eq!(contacts[0].normal, -Vec3::Y);
        assert_eq!(contacts[0].point, Vec3::ZERO);
    }

    #[test]
    fn static_pairs_are_skipped() {
        let bodies = [ground(), ground()];
        let mut d = dispatcher();
        assert!(d.dispatch_all_collision_pairs(&bodies, &[(0, 1)]).is_empty());
    }

    #[test]
    fn contact_pool_is_bounded() {
        let config = DefaultCollisionConfiguration {
            max_contacts: 1,
            ..Default::default()
        };
        let mut d = CollisionDispatcher::new(&config);
        let bodies = [
            sphere_at(Vec3::ZERO, 1.0),
            sphere_at(Vec3::new(0.5, 0.0, 0.0), 1.0),
            sphere_at(Vec3::new(1.0, 0.0, 0.0), 1.0),
        ];
        let contacts = d.dispatch_all_collision_pairs(&bodies, &[(0, 1), (0, 2), (1, 2)]);
        assert_eq!(contacts.len(), 1);
    }
}
