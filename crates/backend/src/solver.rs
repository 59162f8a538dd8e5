use glam::Vec3;
use physworld_kernel::SolverInfo;

use crate::body::Body;
use crate::dispatcher::Contact;

/// A distance constraint resolved to body indices for one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointRow {
    pub body_a: usize,
    pub body_b: usize,
    pub rest_length: f32,
}

/// Sequential impulse solver for contacts and distance joints. Linear only.
///
/// With split impulse disabled, penetration recovery is folded into the
/// velocity impulse (Baumgarte). With it enabled, velocities only remove
/// approach speed and penetration is pushed out by a position-only correction.
#[derive(Debug, Clone)]
pub struct SequentialImpulseSolver {
    /// Penetration tolerated before recovery kicks in.
    linear_slop: f32,
    accumulated: Vec<f32>,
}

impl SequentialImpulseSolver {
    pub fn new(linear_slop: f32) -> Self {
        Self {
            linear_slop,
            accumulated: Vec::new(),
        }
    }

    pub fn solve_group(
        &mut self,
        bodies: &mut [Body],
        contacts: &[Contact],
        joints: &[JointRow],
        info: &SolverInfo,
        dt: f32,
    ) {
        if dt <= 0.0 || (contacts.is_empty() && joints.is_empty()) {
            return;
        }
        self.accumulated.clear();
        self.accumulated.resize(contacts.len(), 0.0);

        let targets: Vec<f32> = contacts
            .iter()
            .map(|c| self.contact_target(bodies, c, info, dt))
            .collect();

        for _ in 0..info.num_iterations.max(1) {
            for (k, contact) in contacts.iter().enumerate() {
                let inv_a = bodies[contact.body_a].inverse_mass();
                let inv_b = bodies[contact.body_b].inverse_mass();
                let inv_sum = inv_a + inv_b;
                if inv_sum <= 0.0 {
                    continue;
                }
                let vn = relative_normal_velocity(
                    bodies,
                    contact.body_a,
                    contact.body_b,
                    contact.normal,
                );
                let lambda = (targets[k] - vn) / inv_sum;
                let previous = self.accumulated[k];
                self.accumulated[k] = (previous + lambda).max(0.0);
                let applied = self.accumulated[k] - previous;
                apply_pair_impulse(
                    bodies,
                    contact.body_a,
                    contact.body_b,
                    contact.normal * applied,
                );
            }

            for joint in joints {
                solve_joint(bodies, joint, info.erp, dt);
            }
        }

        if info.split_impulse {
            for contact in contacts {
                self.push_out(bodies, contact, info.erp);
            }
        }

        tracing::trace!(
            contacts = contacts.len(),
            joints = joints.len(),
            iterations = info.num_iterations,
            "solver pass"
        );
    }

    /// Desired separating velocity along the contact normal.
    fn contact_target(&self, bodies: &[Body], contact: &Contact, info: &SolverInfo, dt: f32) -> f32 {
        let vn = relative_normal_velocity(bodies, contact.body_a, contact.body_b, contact.normal);
        let restitution = bodies[contact.body_a]
            .restitution()
            .max(bodies[contact.body_b].restitution());
        let bounce = if vn < 0.0 { -restitution * vn } else { 0.0 };

        let recovery = if contact.depth < 0.0 {
            // Still separated: allow closing the gap within this step.
            contact.depth / dt
        } else if info.split_impulse {
            0.0
        } else {
            info.erp / dt * (contact.depth - self.linear_slop).max(0.0)
        };
        bounce.max(recovery)
    }

    fn push_out(&self, bodies: &mut [Body], contact: &Contact, erp: f32) {
        let inv_a = bodies[contact.body_a].inverse_mass();
        let inv_b = bodies[contact.body_b].inverse_mass();
        let inv_sum = inv_a + inv_b;
        let penetration = (contact.depth - self.linear_slop).max(0.0);
        if inv_sum <= 0.0 || penetration <= 0.0 {
            return;
        }
        let correction = contact.normal * (penetration * erp / inv_sum);
        bodies[contact.body_a].transform.position -= correction * inv_a;
        bodies[contact.body_b].transform.position += correction * inv_b;
    }
}

fn relative_normal_velocity(bodies: &[Body], a: usize, b: usize, normal: Vec3) -> f32 {
    (bodies[b].linear_velocity() - bodies[a].linear_velocity()).dot(normal)
}

fn apply_pair_impulse(bodies: &mut [Body], a: usize, b: usize, impulse: Vec3) {
    bodies[a].apply_central_impulse(-impulse);
    bodies[b].apply_central_impulse(impulse);
}

fn solve_joint(bodies: &mut [Body], joint: &JointRow, erp: f32, dt: f32) {
    let inv_sum = bodies[joint.body_a].inverse_mass() + bodies[joint.body_b].inverse_mass();
    if inv_sum <= 0.0 {
        return;
    }
    let delta = bodies[joint.body_b].position() - bodies[joint.body_a].position();
    let length = delta.length();
    if length <= f32::EPSILON {
        return;
    }
    let axis = delta / length;
    let error = length - joint.rest_length;
    let vn = relative_normal_velocity(bodies, joint.body_a, joint.body_b, axis);
    let lambda = (-erp / dt * error - vn) / inv_sum;
    apply_pair_impulse(bodies, joint.body_a, joint.body_b, axis * lambda);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use physworld_common::Transform;

    fn falling_sphere_on_ground(depth: f32) -> (Vec<Body>, Contact) {
        let ground = Body::new_static(Shape::plane(Vec3::Y, 0.0), Transform::default());
        let sphere = Body::new_rigid(
            Shape::sphere(0.5),
            1.0,
            Transform::from_position(Vec3::new(0.0, 0.5 - depth, 0.0)),
        )
        .with_velocity(Vec3::new(0.0, -3.0, 0.0));
        let contact = Contact {
            body_a: 0,
            body_b: 1,
            normal: Vec3::Y,
            depth,
            point: Vec3::ZERO,
        };
        (vec![ground, sphere], contact)
    }

    fn info(split_impulse: bool) -> SolverInfo {
        SolverInfo {
            split_impulse,
            ..Default::default()
        }
    }

    #[test]
    fn contact_stops_approach() {
        let (mut bodies, contact) = falling_sphere_on_ground(0.0);
        let mut solver = SequentialImpulseSolver::new(0.005);
        solver.solve_group(&mut bodies, &[contact], &[], &info(true), 1.0 / 60.0);
        assert!(bodies[1].linear_velocity().y.abs() < 1e-5);
    }

    #[test]
    fn restitution_bounces() {
        let (mut bodies, contact) = falling_sphere_on_ground(0.0);
        if let Some(rigid) = bodies[1].rigid_mut() {
            rigid.restitution = 1.0;
        }
        let mut solver = SequentialImpulseSolver::new(0.005);
        solver.solve_group(&mut bodies, &[contact], &[], &info(true), 1.0 / 60.0);
        assert!((bodies[1].linear_velocity().y - 3.0).abs() < 1e-4);
    }

    #[test]
    fn baumgarte_adds_separating_velocity_without_split_impulse() {
        let (mut bodies, contact) = falling_sphere_on_ground(0.1);
        let before = bodies[1].position();
        let mut solver = SequentialImpulseSolver::new(0.005);
        solver.solve_group(&mut bodies, &[contact], &[], &info(false), 1.0 / 60.0);
        assert!(bodies[1].linear_velocity().y > 0.0);
        assert_eq!(bodies[1].position(), before);
    }

    #[test]
    fn split_impulse_corrects_position_only() {
        let (mut bodies, contact) = falling_sphere_on_ground(0.1);
        let before = bodies[1].position();
        let mut solver = SequentialImpulseSolver::new(0.005);
        solver.solve_group(&mut bodies, &[contact], &[], &info(true), 1.0 / 60.0);
        assert!(bodies[1].linear_velocity().y.abs() < 1e-5);
        assert!(bodies[1].position().y > before.y);
    }

    #[test]
    fn joint_pulls_stretched_bodies_together() {
        let mut bodies = vec![
            Body::new_rigid(Shape::sphere(0.1), 1.0, Transform::default()),
            Body::new_rigid(
                Shape::sphere(0.1),
                1.0,
                Transform::from_position(Vec3::new(2.0, 0.0, 0.0)),
            ),
        ];
        let joint = JointRow {
            body_a: 0,
            body_b: 1,
            rest_length: 1.0,
        };
        let mut solver = SequentialImpulseSolver::new(0.005);
        solver.solve_group(&mut bodies, &[], &[joint], &info(false), 1.0 / 60.0);
        assert!(bodies[0].linear_velocity().x > 0.0);
        assert!(bodies[1].linear_velocity().x < 0.0);
    }

    #[test]
    fn zero_dt_is_ignored() {
        let (mut bodies, contact) = falling_sphere_on_ground(0.0);
        let mut solver = SequentialImpulseSolver::new(0.005);
        solver.solve_group(&mut bodies, &[contact], &[], &info(false), 0.0);
        assert_eq!(bodies[1].linear_velocity().y, -3.0);
    }
}
