use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Surface coefficients of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Bounciness in `[0, 1]`.
    pub restitution: f32,
    /// Coulomb friction coefficient, `>= 0`.
    pub friction: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.2,
            friction: 0.4,
        }
    }
}

impl Material {
    pub fn new(restitution: f32, friction: f32) -> Self {
        Self {
            restitution,
            friction,
        }
        .sanitized()
    }

    pub fn frictionless(restitution: f32) -> Self {
        Self::new(restitution, 0.0)
    }

    /// Clamps the coefficients into their valid ranges.
    pub fn sanitized(self) -> Self {
        let restitution = if self.restitution.is_finite() {
            self.restitution.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let friction = if self.friction.is_finite() {
            self.friction.max(0.0)
        } else {
            0.0
        };
        Self {
            restitution,
            friction,
        }
    }

    /// Coefficients used by a contact between two materials.
    pub fn combine(&self, other: &Material) -> MaterialPair {
        MaterialPair {
            restitution: 0.5 * (self.restitution + other.restitution),
            friction: 0.5 * (self.friction + other.friction),
        }
    }
}

/// Mixed coefficients of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaterialPair {
    pub restitution: f32,
    pub friction: f32,
}

/// Principal-axis inertia helpers for box bodies.
pub trait InertiaTensorExt {
    fn for_solid_box(half_extents: Vec3, mass: f32) -> Self;
    fn inverse_diagonal(self) -> Self;
}

impl InertiaTensorExt for Vec3 {
    fn for_solid_box(half_extents: Vec3, mass: f32) -> Vec3 {
        let size = half_extents * 2.0;
        let sq = size * size;
        Vec3::new(sq.y + sq.z, sq.x + sq.z, sq.x + sq.y) * (mass / 12.0)
    }

    fn inverse_diagonal(self) -> Vec3 {
        let invert = |v: f32| if v > f32::EPSILON { 1.0 / v } else { 0.0 };
        Vec3::new(invert(self.x), invert(self.y), invert(self.z))
    }
}
