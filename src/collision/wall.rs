use glam::Vec3;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{config::WallMaterial, core::rigidbody::RigidBody};

/// Static half-space: points with `normal · p < constant` are inside the wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub normal: Vec3,
    pub constant: f32,
}

impl Wall {
    /// Plane `normal · p = constant`; the normal is normalized and falls back
    /// to `+Y` when degenerate.
    pub fn new(normal: Vec3, constant: f32) -> Self {
        let normal = match normal.try_normalize() {
            Some(normal) => normal,
            None => {
                warn!("degenerate wall normal {normal:?}, using +Y");
                Vec3::Y
            }
        };
        Self { normal, constant }
    }

    /// Surface of a slab of the given thickness centered at `center`, facing `normal`.
    pub fn from_slab(normal: Vec3, center: Vec3, thickness: f32) -> Self {
        let wall = Self::new(normal, 0.0);
        let surface = center + wall.normal * (thickness * 0.5);
        Self {
            constant: wall.normal.dot(surface),
            ..wall
        }
    }

    /// Depth of `point` below the surface; positive when penetrating.
    pub fn penetration(&self, point: Vec3) -> f32 {
        self.constant - self.normal.dot(point)
    }
}

/// What one body's wall pass produced.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WallResponse {
    pub touching: bool,
    pub max_penetration: f32,
    pub force: Vec3,
    pub torque: Vec3,
}

/// Penalty-spring response of box corners against static walls.
#[derive(Debug, Clone, Default)]
pub struct WallSolver {
    material: WallMaterial,
}

impl WallSolver {
    pub fn new(material: WallMaterial) -> Self {
        Self { material }
    }

    pub fn material(&self) -> &WallMaterial {
        &self.material
    }

    /// Accumulates bounce, friction, penalty and damping forces for every
    /// penetrating corner of an awake body, adds them to the body and then
    /// pushes it out along the deepest wall normal.
    ///
    /// The bounce share of each approaching corner is sized so the whole body
    /// leaves with `bounce` times its inbound normal speed after one step.
    pub fn resolve(&self, body: &mut RigidBody, walls: &[Wall], dt: f32) -> WallResponse {
        let mut response = WallResponse::default();
        if walls.is_empty() || body.is_static() || !body.is_awake() || dt <= 0.0 {
            return response;
        }

        let center = body.position;
        let velocity = body.velocity();
        let angular_velocity = body.angular_velocity();
        let mass = body.mass();
        let corners = body.corners();
        let mut deepest: Option<(Vec3, f32)> = None;

        for wall in walls {
            let n = wall.normal;
            let hits: Vec<(Vec3, f32, Vec3)> = corners
                .iter()
                .filter_map(|&corner| {
                    let depth = wall.penetration(corner);
                    let r = corner - center;
                    (depth > 0.0).then(|| (r, depth, angular_velocity.cross(r) + velocity))
                })
                .collect();
            if hits.is_empty() {
                continue;
            }
            let approaching = hits.iter().filter(|(_, _, v)| n.dot(*v) < 0.0).count();

            for (r, depth, point_velocity) in hits {
                let normal_speed = n.dot(point_velocity);
                let mut force = Vec3::ZERO;
                if normal_speed < 0.0 {
                    let inbound = -normal_speed;
                    force += n * (mass * (1.0 + self.material.bounce) * inbound
                        / (dt * approaching as f32));
                }
                let tangential = point_velocity - n * normal_speed;
                force -= tangential * self.material.friction;
                force += n * (self.material.penalty * depth);
                force -= n * (self.material.damping * depth * normal_speed);

                response.force += force;
                response.torque += r.cross(force);
                if deepest.map_or(true, |(_, max)| depth > max) {
                    deepest = Some((n, depth));
                }
            }
        }

        let Some((normal, max_penetration)) = deepest else {
            return response;
        };
        response.touching = true;
        response.max_penetration = max_penetration;

        body.add_force(response.force);
        body.add_torque(response.torque);
        if !self.material.is_fluid {
            body.position += normal * (max_penetration * self.material.elasticity);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn floor() -> Wall {
        Wall::new(Vec3::Y, 0.0)
    }

    #[test]
    fn slab_surface_sits_half_a_thickness_out() {
        let wall = Wall::from_slab(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, -1.0, 0.0), 1.0);
        assert_relative_eq!(wall.normal.y, 1.0);
        assert_relative_eq!(wall.constant, -0.5);
        assert_relative_eq!(wall.penetration(Vec3::new(3.0, -0.7, 1.0)), 0.2, epsilon = 1e-6);
    }

    #[test]
    fn degenerate_normal_falls_back_to_up() {
        assert_eq!(Wall::new(Vec3::ZERO, 1.0).normal, Vec3::Y);
    }

    #[test]
    fn clear_body_is_untouched() {
        let mut body = RigidBody::default().with_position(Vec3::new(0.0, 2.0, 0.0));
        let response = WallSolver::default().resolve(&mut body, &[floor()], 0.02);
        assert!(!response.touching);
        assert_eq!(body.accumulated_force(), Vec3::ZERO);
    }

    #[test]
    fn flat_landing_pushes_straight_up_and_corrects_position() {
        let solver = WallSolver::new(WallMaterial {
            friction: 0.0,
            ..WallMaterial::default()
        });
        let mut body = RigidBody::default()
            .with_position(Vec3::new(0.0, 0.48, 0.0))
            .with_velocity(Vec3::new(0.0, -3.0, 0.0));
        let response = solver.resolve(&mut body, &[floor()], 0.02);

        assert!(response.touching);
        assert_relative_eq!(response.max_penetration, 0.02, epsilon = 1e-5);
        assert!(response.force.y > 0.0);
        assert!(response.force.x.abs() < 1e-4 && response.force.z.abs() < 1e-4);
        assert!(response.torque.length() < 1e-3);
        assert_relative_eq!(body.position.y, 0.48 + 0.02 * 0.5, epsilon = 1e-5);
    }

    #[test]
    fn fluid_walls_do_not_move_bodies() {
        let solver = WallSolver::new(WallMaterial {
            is_fluid: true,
            ..WallMaterial::default()
        });
        let mut body = RigidBody::default().with_position(Vec3::new(0.0, 0.4, 0.0));
        let response = solver.resolve(&mut body, &[floor()], 0.02);
        assert!(response.touching);
        assert_relative_eq!(body.position.y, 0.4);
        assert!(body.accumulated_force().y > 0.0);
    }

    #[test]
    fn sliding_corners_feel_friction() {
        let mut body = RigidBody::default()
            .with_position(Vec3::new(0.0, 0.49, 0.0))
            .with_velocity(Vec3::new(2.0, 0.0, 0.0));
        let response = WallSolver::default().resolve(&mut body, &[floor()], 0.02);
        assert!(response.force.x < 0.0);
    }

    #[test]
    fn sleeping_bodies_are_skipped() {
        let mut body = RigidBody::default()
            .with_position(Vec3::new(0.0, 0.4, 0.0))
            .with_awake(false);
        let response = WallSolver::default().resolve(&mut body, &[floor()], 0.02);
        assert!(!response.touching);
    }
}
