//! Awake/asleep activity model.
//!
//! Each awake body keeps an exponential moving average of `|v|² + |ω|²`.
//! Sleep-capable bodies whose average drops below the threshold go to sleep.
//! Field pushes, explicit forces and contacts that hit harder than
//! `wake_speed` wake them again; a body merely resting on a sleeper does not.

use log::debug;

use crate::{config::SleepConfig, core::rigidbody::RigidBody};

#[derive(Debug, Clone, Copy)]
pub struct SleepModel {
    pub epsilon: f32,
    pub base_bias: f32,
    pub max_motion: f32,
    pub wake_motion: f32,
    pub wake_speed: f32,
}

impl Default for SleepModel {
    fn default() -> Self {
        Self::from_config(&SleepConfig::default())
    }
}

impl SleepModel {
    pub fn from_config(config: &SleepConfig) -> Self {
        Self {
            epsilon: config.epsilon,
            base_bias: config.base_bias,
            max_motion: config.epsilon * config.max_motion_factor,
            wake_motion: config.epsilon * config.wake_motion_factor,
            wake_speed: config.wake_speed,
        }
    }

    /// Folds this step's motion into the body's average. Returns `true` when
    /// the body fell asleep during this call.
    pub fn update(&self, body: &mut RigidBody, dt: f32) -> bool {
        if !body.is_awake() || body.is_static() {
            return false;
        }

        let bias = self.base_bias.powf(dt);
        let current = body.velocity().length_squared() + body.angular_velocity().length_squared();
        let motion = (bias * body.motion() + (1.0 - bias) * current).min(self.max_motion);
        body.set_motion(motion);

        if body.can_sleep && motion < self.epsilon {
            debug!("body {:?} fell asleep (motion {motion:.4})", body.id);
            body.put_to_sleep();
            return true;
        }
        false
    }

    pub fn wake(&self, body: &mut RigidBody) {
        if body.is_awake() || body.is_static() {
            return;
        }
        debug!("body {:?} woke up", body.id);
        body.wake(self.wake_motion);
    }

    pub fn put_to_sleep(&self, body: &mut RigidBody) {
        body.put_to_sleep();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn resting_body_sleeps_once_and_stays_asleep() {
        let model = SleepModel::default();
        let mut body = RigidBody::default();
        body.wake(model.wake_motion);

        let mut transitions = 0;
        for _ in 0..400 {
            if model.update(&mut body, 0.02) {
                transitions += 1;
            }
        }
        assert_eq!(transitions, 1);
        assert!(!body.is_awake());
        assert_eq!(body.velocity(), Vec3::ZERO);
    }

    #[test]
    fn wake_seeds_motion_above_threshold() {
        let model = SleepModel::default();
        let mut body = RigidBody::default().with_awake(false);
        model.wake(&mut body);
        assert!(body.is_awake());
        assert!(body.motion() > model.epsilon);
        assert!(!model.update(&mut body, 0.02));
    }

    #[test]
    fn bodies_that_cannot_sleep_stay_awake() {
        let model = SleepModel::default();
        let mut body = RigidBody::default().with_can_sleep(false);
        for _ in 0..400 {
            assert!(!model.update(&mut body, 0.02));
        }
        assert!(body.is_awake());
    }

    #[test]
    fn motion_is_clamped() {
        let model = SleepModel::default();
        let mut body = RigidBody::default().with_velocity(Vec3::splat(100.0));
        for _ in 0..200 {
            model.update(&mut body, 0.02);
        }
        assert!(body.motion() <= model.max_motion + 1e-4);
    }
}
