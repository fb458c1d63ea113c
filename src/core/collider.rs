use glam::{Mat3, Vec3};

use super::rigidbody::RigidBody;
use crate::utils::allocator::EntityId;

/// Read-only per-step snapshot of a body's box, rebuilt every step.
#[derive(Debug, Clone, Copy)]
pub struct OrientedBox {
    pub body: EntityId,
    pub center: Vec3,
    /// Orthonormal world-space axes.
    pub axis: [Vec3; 3],
    /// Half widths along each axis.
    pub extents: [f32; 3],
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub inverse_inertia_tensor_world: Mat3,
}

impl OrientedBox {
    pub fn from_body(body: &RigidBody) -> Self {
        let half = body.half_extents();
        Self {
            body: body.id,
            center: body.position,
            axis: body.axes(),
            extents: half.to_array(),
            velocity: body.velocity(),
            angular_velocity: body.angular_velocity(),
            inverse_inertia_tensor_world: body.inverse_inertia_tensor_world(),
        }
    }

    /// Half length of the box's shadow on `axis` (any length; scales with it).
    pub fn projected_radius(&self, axis: Vec3) -> f32 {
        (0..3)
            .map(|i| self.extents[i] * self.axis[i].dot(axis).abs())
            .sum()
    }

    /// Half sizes of the tightest world-axis-aligned box around this one.
    pub fn world_half_extents(&self) -> Vec3 {
        Vec3::new(
            self.projected_radius(Vec3::X),
            self.projected_radius(Vec3::Y),
            self.projected_radius(Vec3::Z),
        )
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let mut corners = [self.center; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            for (k, axis) in self.axis.iter().enumerate() {
                let sign = if i & (1 << k) == 0 { -1.0 } else { 1.0 };
                *corner += *axis * (sign * self.extents[k]);
            }
        }
        corners
    }

    /// Velocity of a world-space point moving with the box.
    pub fn point_velocity(&self, point: Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(point - self.center)
    }
}
