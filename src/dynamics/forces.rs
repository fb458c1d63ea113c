use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::rigidbody::RigidBody;

/// Anything that turns body state into an external force and torque for one step.
pub trait ForceGenerator {
    fn compute_external_force(&self, body: &RigidBody, gravity: Vec3) -> (Vec3, Vec3);
}

/// Closed set of per-body force sources.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ForceContributor {
    /// Configured gravity scaled by the body's mass.
    Gravity,
    /// Linear and angular drag using the body's damping coefficients.
    Damping,
    /// Host-driven steering force: `direction · speed`.
    PlayerInput { direction: Vec3, speed: f32 },
    #[default]
    None,
}

impl ForceContributor {
    pub fn player(speed: f32) -> Self {
        ForceContributor::PlayerInput {
            direction: Vec3::ZERO,
            speed,
        }
    }
}

impl ForceGenerator for ForceContributor {
    fn compute_external_force(&self, body: &RigidBody, gravity: Vec3) -> (Vec3, Vec3) {
        match *self {
            ForceContributor::Gravity => (gravity * body.mass(), Vec3::ZERO),
            ForceContributor::Damping => (
                -body.velocity() * body.linear_damping,
                -body.angular_velocity() * body.angular_damping,
            ),
            ForceContributor::PlayerInput { direction, speed } => {
                (direction.normalize_or_zero() * speed, Vec3::ZERO)
            }
            ForceContributor::None => (Vec3::ZERO, Vec3::ZERO),
        }
    }
}

impl ForceGenerator for [ForceContributor] {
    fn compute_external_force(&self, body: &RigidBody, gravity: Vec3) -> (Vec3, Vec3) {
        self.iter()
            .map(|contributor| contributor.compute_external_force(body, gravity))
            .fold((Vec3::ZERO, Vec3::ZERO), |(f, t), (df, dt)| (f + df, t + dt))
    }
}

/// Area effect emitted by a body: pushes (or, with a negative force, pulls)
/// every body whose center lies within `radius`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldOfInfluence {
    pub radius: f32,
    pub push_force: f32,
    /// Whether the emitter also collides with the bodies it affects.
    pub collides: bool,
}

impl FieldOfInfluence {
    pub fn new(radius: f32, push_force: f32, collides: bool) -> Self {
        Self {
            radius: radius.max(0.0),
            push_force,
            collides,
        }
    }

    pub fn is_active(&self) -> bool {
        self.radius > 0.0
    }

    /// Force on a body centered at `target` from an emitter centered at `source`.
    pub fn force_on(&self, source: Vec3, target: Vec3) -> Option<Vec3> {
        let offset = target - source;
        let distance_sq = offset.length_squared();
        if distance_sq >= self.radius * self.radius || distance_sq <= f32::EPSILON {
            return None;
        }
        Some(offset / distance_sq.sqrt() * self.push_force)
    }
}

/// Applies every contributor of an awake, dynamic body to its accumulators.
pub fn accumulate_contributors(body: &mut RigidBody, gravity: Vec3) {
    if body.is_static() || !body.is_awake() {
        return;
    }
    let (force, torque) = body.forces.as_slice().compute_external_force(body, gravity);
    body.add_force(force);
    body.add_torque(torque);
}
