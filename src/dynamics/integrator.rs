use glam::{Quat, Vec3};
use log::warn;

use crate::{core::rigidbody::RigidBody, utils::math};

/// Primary integrated quantities of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub position: Vec3,
    pub orientation: Quat,
    pub momentum: Vec3,
    pub angular_momentum: Vec3,
}

impl State {
    pub fn of(body: &RigidBody) -> Self {
        Self {
            position: body.position,
            orientation: body.orientation,
            momentum: body.momentum,
            angular_momentum: body.angular_momentum,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.orientation.is_finite()
            && self.momentum.is_finite()
            && self.angular_momentum.is_finite()
    }
}

/// Time derivative of a [`State`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derivative {
    pub velocity: Vec3,
    pub spin: Quat,
    pub force: Vec3,
    pub torque: Vec3,
}

impl Default for Derivative {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            spin: Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationOutcome {
    Advanced,
    /// The result was not finite; the previous state was kept.
    Discarded,
    /// Static or sleeping bodies are not integrated.
    Skipped,
}

/// Fourth-order Runge-Kutta stepper with force and torque held constant over the step.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub dt: f32,
}

impl Integrator {
    pub fn new(dt: f32) -> Self {
        Self { dt }
    }

    /// Advances one awake body by `dt` using its accumulated force and torque,
    /// then clears the accumulators.
    pub fn integrate(&self, body: &mut RigidBody) -> IntegrationOutcome {
        if body.is_static() || !body.is_awake() {
            body.clear_accumulators();
            return IntegrationOutcome::Skipped;
        }

        let force = body.accumulated_force();
        let torque = body.accumulated_torque();
        let inverse_mass = body.inverse_mass();
        body.last_frame_acceleration = force * inverse_mass;
        body.clear_accumulators();

        let stepper = Stepper {
            force,
            torque,
            inverse_mass,
            inverse_inertia: body.inverse_inertia_tensor(),
        };
        let next = stepper.step(&State::of(body), self.dt);

        let velocity = next.momentum * inverse_mass;
        if !next.is_finite() || !velocity.is_finite() {
            warn!(
                "body {:?}: non-finite integration result discarded (position {:?})",
                body.id, next.position
            );
            body.last_frame_acceleration = Vec3::ZERO;
            return IntegrationOutcome::Discarded;
        }

        body.position = next.position;
        body.orientation = math::normalize_quat(next.orientation);
        body.momentum = next.momentum;
        body.angular_momentum = next.angular_momentum;
        body.recalculate_derived();
        IntegrationOutcome::Advanced
    }
}

struct Stepper {
    force: Vec3,
    torque: Vec3,
    inverse_mass: f32,
    inverse_inertia: Vec3,
}

impl Stepper {
    fn step(&self, initial: &State, dt: f32) -> State {
        let a = self.evaluate(initial, 0.0, &Derivative::default());
        let b = self.evaluate(initial, dt * 0.5, &a);
        let c = self.evaluate(initial, dt * 0.5, &b);
        let d = self.evaluate(initial, dt, &c);

        let sixth = dt / 6.0;
        State {
            position: initial.position
                + (a.velocity + (b.velocity + c.velocity) * 2.0 + d.velocity) * sixth,
            orientation: initial.orientation + (a.spin + (b.spin + c.spin) * 2.0 + d.spin) * sixth,
            momentum: initial.momentum + self.force * dt,
            angular_momentum: initial.angular_momentum + self.torque * dt,
        }
    }

    fn evaluate(&self, initial: &State, dt: f32, derivative: &Derivative) -> Derivative {
        let orientation = math::normalize_quat(initial.orientation + derivative.spin * dt);
        let momentum = initial.momentum + derivative.force * dt;
        let angular_momentum = initial.angular_momentum + derivative.torque * dt;

        let angular_velocity =
            math::world_inverse_inertia(orientation, self.inverse_inertia) * angular_momentum;
        Derivative {
            velocity: momentum * self.inverse_mass,
            spin: math::spin(angular_velocity, orientation),
            force: self.force,
            torque: self.torque,
        }
    }
}
