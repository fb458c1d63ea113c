use glam::{Mat3, Quat, Vec3};
use log::warn;

use super::types::{InertiaTensorExt, Material};
use crate::{
    config::{DEFAULT_ANGULAR_DAMPING, DEFAULT_HALF_EXTENT, DEFAULT_LINEAR_DAMPING},
    dynamics::forces::{FieldOfInfluence, ForceContributor},
    utils::{allocator::EntityId, math},
};

/// Oriented box body whose primary integrated quantities are momentum and
/// angular momentum; velocities are derived from them.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub id: EntityId,
    pub position: Vec3,
    /// Unit quaternion, renormalized after every update.
    pub orientation: Quat,
    pub momentum: Vec3,
    pub angular_momentum: Vec3,
    pub material: Material,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub can_sleep: bool,
    /// Acceleration produced by the forces of the previous step.
    pub last_frame_acceleration: Vec3,
    pub forces: Vec<ForceContributor>,
    pub field_of_influence: Option<FieldOfInfluence>,

    velocity: Vec3,
    angular_velocity: Vec3,
    spin: Quat,
    mass: f32,
    inverse_mass: f32,
    half_extents: Vec3,
    inertia_tensor: Vec3,
    inverse_inertia_tensor: Vec3,
    inverse_inertia_tensor_world: Mat3,
    is_awake: bool,
    is_static: bool,
    motion: f32,
    accumulated_force: Vec3,
    accumulated_torque: Vec3,
}

impl Default for RigidBody {
    fn default() -> Self {
        let mut body = Self {
            id: EntityId::default(),
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            momentum: Vec3::ZERO,
            angular_momentum: Vec3::ZERO,
            material: Material::default(),
            linear_damping: DEFAULT_LINEAR_DAMPING,
            angular_damping: DEFAULT_ANGULAR_DAMPING,
            can_sleep: true,
            last_frame_acceleration: Vec3::ZERO,
            forces: vec![ForceContributor::Gravity, ForceContributor::Damping],
            field_of_influence: None,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            spin: Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
            mass: 1.0,
            inverse_mass: 1.0,
            half_extents: Vec3::splat(DEFAULT_HALF_EXTENT),
            inertia_tensor: Vec3::ONE,
            inverse_inertia_tensor: Vec3::ONE,
            inverse_inertia_tensor_world: Mat3::IDENTITY,
            is_awake: true,
            is_static: false,
            motion: 0.0,
            accumulated_force: Vec3::ZERO,
            accumulated_torque: Vec3::ZERO,
        };
        body.recompute_mass_properties();
        body
    }
}

impl RigidBody {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Box body with the given half extents and mass (both clamped when degenerate).
    pub fn cuboid(half_extents: Vec3, mass: f32) -> Self {
        let mut body = Self::default();
        body.set_half_extents(half_extents);
        body.set_mass(mass);
        body
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = math::normalize_quat(orientation);
        self.recalculate_derived();
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.set_velocity(velocity);
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.set_angular_velocity(angular_velocity);
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material.sanitized();
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear.max(0.0);
        self.angular_damping = angular.max(0.0);
        self
    }

    pub fn with_can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    pub fn with_awake(mut self, awake: bool) -> Self {
        if awake {
            self.is_awake = !self.is_static;
        } else {
            self.put_to_sleep();
        }
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.set_static(is_static);
        self
    }

    pub fn with_forces(mut self, forces: Vec<ForceContributor>) -> Self {
        self.forces = forces;
        self
    }

    pub fn with_field_of_influence(mut self, field: FieldOfInfluence) -> Self {
        self.field_of_influence = Some(field);
        self
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    /// Diagonal body-space inertia tensor.
    pub fn inertia_tensor(&self) -> Vec3 {
        self.inertia_tensor
    }

    pub fn inverse_inertia_tensor(&self) -> Vec3 {
        self.inverse_inertia_tensor
    }

    pub fn inverse_inertia_tensor_world(&self) -> Mat3 {
        self.inverse_inertia_tensor_world
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    /// Orientation derivative `0.5 · (ω, 0) · q`.
    pub fn spin(&self) -> Quat {
        self.spin
    }

    pub fn is_awake(&self) -> bool {
        self.is_awake
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn motion(&self) -> f32 {
        self.motion
    }

    pub(crate) fn set_motion(&mut self, motion: f32) {
        self.motion = motion;
    }

    pub fn accumulated_force(&self) -> Vec3 {
        self.accumulated_force
    }

    pub fn accumulated_torque(&self) -> Vec3 {
        self.accumulated_torque
    }

    /// Sets the mass, clamping non-positive or non-finite values to 1.
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = if mass.is_finite() && mass > 0.0 {
            mass
        } else {
            warn!("body {:?}: degenerate mass {mass}, clamping to 1", self.id);
            1.0
        };
        self.recompute_mass_properties();
    }

    /// Sets the box half extents, replacing degenerate components with the default.
    pub fn set_half_extents(&mut self, half_extents: Vec3) {
        let clamp = |v: f32| {
            if v.is_finite() && v > 0.0 {
                v
            } else {
                DEFAULT_HALF_EXTENT
            }
        };
        let clamped = Vec3::new(clamp(half_extents.x), clamp(half_extents.y), clamp(half_extents.z));
        if clamped != half_extents {
            warn!("body {:?}: degenerate extents {half_extents:?}, using {clamped:?}", self.id);
        }
        self.half_extents = clamped;
        self.recompute_mass_properties();
    }

    pub fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
        if is_static {
            self.put_to_sleep();
            self.can_sleep = false;
        }
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.momentum = velocity * self.mass;
        self.recalculate_derived();
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: Vec3) {
        let rotation = Mat3::from_quat(self.orientation);
        let inertia_world =
            rotation * Mat3::from_diagonal(self.inertia_tensor) * rotation.transpose();
        self.angular_momentum = inertia_world * angular_velocity;
        self.recalculate_derived();
    }

    pub fn add_force(&mut self, force: Vec3) {
        self.accumulated_force += force;
    }

    pub fn add_torque(&mut self, torque: Vec3) {
        self.accumulated_torque += torque;
    }

    /// Adds a force applied at a world-space point, producing torque about the center.
    pub fn add_force_at_point(&mut self, force: Vec3, point: Vec3) {
        self.accumulated_force += force;
        self.accumulated_torque += (point - self.position).cross(force);
    }

    pub fn clear_accumulators(&mut self) {
        self.accumulated_force = Vec3::ZERO;
        self.accumulated_torque = Vec3::ZERO;
    }

    /// Applies an impulse at a world-space point as a momentum delta.
    pub fn apply_impulse_at(&mut self, impulse: Vec3, point: Vec3) {
        self.momentum += impulse;
        self.angular_momentum += (point - self.position).cross(impulse);
        self.recalculate_derived();
    }

    /// Refreshes velocity, angular velocity, spin and the world inverse inertia
    /// from the primary state.
    pub fn recalculate_derived(&mut self) {
        self.inverse_inertia_tensor_world =
            math::world_inverse_inertia(self.orientation, self.inverse_inertia_tensor);
        self.velocity = self.momentum * self.inverse_mass;
        self.angular_velocity = self.inverse_inertia_tensor_world * self.angular_momentum;
        self.spin = math::spin(self.angular_velocity, self.orientation);
    }

    /// Marks the body awake and seeds its motion average so it does not re-sleep at once.
    pub fn wake(&mut self, motion: f32) {
        if self.is_static {
            return;
        }
        self.is_awake = true;
        self.motion = motion;
    }

    /// Marks the body asleep: momenta, derived velocities and accumulators are cleared.
    pub fn put_to_sleep(&mut self) {
        self.is_awake = false;
        self.momentum = Vec3::ZERO;
        self.angular_momentum = Vec3::ZERO;
        self.clear_accumulators();
        self.recalculate_derived();
    }

    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.momentum.dot(self.velocity) + 0.5 * self.angular_momentum.dot(self.angular_velocity)
    }

    /// Inverse mass seen by the contact resolver. Static anchors and sleeping
    /// bodies do not respond until something wakes them.
    pub fn effective_inverse_mass(&self) -> f32 {
        if self.is_static || !self.is_awake {
            0.0
        } else {
            self.inverse_mass
        }
    }

    pub fn effective_inverse_inertia_world(&self) -> Mat3 {
        if self.is_static || !self.is_awake {
            Mat3::ZERO
        } else {
            self.inverse_inertia_tensor_world
        }
    }

    /// World-space box axes (columns of the rotation).
    pub fn axes(&self) -> [Vec3; 3] {
        let rotation = Mat3::from_quat(self.orientation);
        [rotation.x_axis, rotation.y_axis, rotation.z_axis]
    }

    /// World-space corners, ordered by the sign pattern of the local axes.
    pub fn corners(&self) -> [Vec3; 8] {
        let [ax, ay, az] = self.axes();
        let e = self.half_extents;
        let mut corners = [Vec3::ZERO; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let sx = if i & 1 == 0 { -1.0 } else { 1.0 };
            let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
            let sz = if i & 4 == 0 { -1.0 } else { 1.0 };
            *corner = self.position + ax * (sx * e.x) + ay * (sy * e.y) + az * (sz * e.z);
        }
        corners
    }

    fn recompute_mass_properties(&mut self) {
        self.inverse_mass = 1.0 / self.mass;
        self.inertia_tensor = Vec3::for_solid_box(self.half_extents, self.mass);
        self.inverse_inertia_tensor = self.inertia_tensor.inverse_diagonal();
        self.recalculate_derived();
    }
}
