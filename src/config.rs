//! Simulation configuration: documented defaults plus the immutable
//! [`SimulationConfig`] handed to the world at construction.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default gravity vector applied by [`crate::ForceContributor::Gravity`] (Y-up).
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -9.81, 0.0];

/// Default fixed integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 0.02;

/// Longest host frame delta fed into the accumulator; longer frames are clamped.
pub const DEFAULT_MAX_FRAME_TIME: f32 = 1.0 / 30.0;

/// Activity threshold below which a sleep-capable body goes to sleep.
pub const DEFAULT_SLEEP_EPSILON: f32 = 0.3;

/// Per-second weight kept by the motion average (`bias = base^dt`).
pub const DEFAULT_SLEEP_BASE_BIAS: f32 = 0.5;

/// Closing speed, beyond one step of acceleration, at which a contact wakes a sleeping body.
pub const DEFAULT_WAKE_SPEED: f32 = 0.05;

/// Penetration below which the position pass stops correcting.
pub const DEFAULT_POSITION_EPSILON: f32 = 0.01;

/// Desired velocity change below which the velocity pass stops applying impulses.
pub const DEFAULT_VELOCITY_EPSILON: f32 = 0.01;

/// Closing speed below which restitution is suppressed for resting contacts.
pub const DEFAULT_RESTITUTION_VELOCITY_LIMIT: f32 = 0.25;

/// Angular share of a positional correction, relative to the contact lever arm.
pub const DEFAULT_ANGULAR_MOVE_LIMIT: f32 = 0.2;

/// Default damping applied to linear velocity.
pub const DEFAULT_LINEAR_DAMPING: f32 = 0.05;

/// Default damping applied to angular velocity.
pub const DEFAULT_ANGULAR_DAMPING: f32 = 0.05;

/// Default half extent used when a box is configured with a degenerate size.
pub const DEFAULT_HALF_EXTENT: f32 = 0.5;

/// Default half size of the cubic broad-phase volume.
pub const DEFAULT_OCTREE_HALF_SIZE: f32 = 64.0;

/// Sleep/wake tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepConfig {
    pub epsilon: f32,
    pub base_bias: f32,
    /// Motion is clamped to `epsilon * max_motion_factor`.
    pub max_motion_factor: f32,
    /// Motion assigned on wake-up, as a multiple of `epsilon`.
    pub wake_motion_factor: f32,
    /// Resting contacts slower than this leave a sleeping partner asleep.
    pub wake_speed: f32,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_SLEEP_EPSILON,
            base_bias: DEFAULT_SLEEP_BASE_BIAS,
            max_motion_factor: 10.0,
            wake_motion_factor: 2.0,
            wake_speed: DEFAULT_WAKE_SPEED,
        }
    }
}

/// Contact resolver tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub position_epsilon: f32,
    pub velocity_epsilon: f32,
    pub restitution_velocity_limit: f32,
    pub angular_move_limit: f32,
    /// Iterations granted to each pass per contact in a batch.
    pub iterations_per_contact: usize,
    /// Upper bound on iterations per pass regardless of batch size.
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            position_epsilon: DEFAULT_POSITION_EPSILON,
            velocity_epsilon: DEFAULT_VELOCITY_EPSILON,
            restitution_velocity_limit: DEFAULT_RESTITUTION_VELOCITY_LIMIT,
            angular_move_limit: DEFAULT_ANGULAR_MOVE_LIMIT,
            iterations_per_contact: 4,
            max_iterations: 512,
        }
    }
}

impl SolverConfig {
    pub fn iterations_for(&self, contact_count: usize) -> usize {
        contact_count
            .saturating_mul(self.iterations_per_contact)
            .clamp(1, self.max_iterations.max(1))
    }
}

/// Shared response parameters for static walls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallMaterial {
    /// Fraction of the inbound normal speed returned by the bounce force.
    pub bounce: f32,
    /// Tangential drag per penetrating corner.
    pub friction: f32,
    /// Spring constant of the penetration penalty per corner.
    pub penalty: f32,
    /// Damping applied proportionally to `depth × normal speed` per corner.
    pub damping: f32,
    /// Fraction of the deepest penetration removed by direct position correction.
    pub elasticity: f32,
    /// Fluid walls never correct positions directly.
    pub is_fluid: bool,
}

impl Default for WallMaterial {
    fn default() -> Self {
        Self {
            bounce: 0.4,
            friction: 0.3,
            penalty: 150.0,
            damping: 20.0,
            elasticity: 0.5,
            is_fluid: false,
        }
    }
}

/// Broad-phase octree volume and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    pub center: Vec3,
    pub half_size: Vec3,
    pub max_depth: u8,
    /// A leaf splits once it holds more bodies than this.
    pub split_threshold: usize,
    /// A subtree collapses once it holds fewer bodies than this.
    pub merge_threshold: usize,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            half_size: Vec3::splat(DEFAULT_OCTREE_HALF_SIZE),
            max_depth: 6,
            split_threshold: 6,
            merge_threshold: 3,
        }
    }
}

/// Immutable simulation parameters, constructed once at setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub timestep: f32,
    pub max_frame_time: f32,
    pub gravity: Vec3,
    pub sleep: SleepConfig,
    pub solver: SolverConfig,
    pub walls: WallMaterial,
    pub broadphase: OctreeConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timestep: DEFAULT_TIME_STEP,
            max_frame_time: DEFAULT_MAX_FRAME_TIME,
            gravity: Vec3::from_array(DEFAULT_GRAVITY),
            sleep: SleepConfig::default(),
            solver: SolverConfig::default(),
            walls: WallMaterial::default(),
            broadphase: OctreeConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn with_timestep(mut self, timestep: f32) -> Self {
        self.timestep = timestep;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_walls(mut self, walls: WallMaterial) -> Self {
        self.walls = walls;
        self
    }

    /// Checks everything the kernel cannot clamp into a usable value.
    pub fn validate(&self) -> ConfigResult<()> {
        if !positive(self.timestep) {
            return Err(ConfigError::InvalidTimestep(self.timestep));
        }
        if self.max_frame_time.is_nan() || self.max_frame_time < self.timestep {
            return Err(ConfigError::FrameTimeBelowTimestep {
                max_frame_time: self.max_frame_time,
                timestep: self.timestep,
            });
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::NonFiniteGravity(self.gravity.to_array()));
        }

        let sleep = &self.sleep;
        if !positive(sleep.epsilon) {
            return Err(ConfigError::InvalidSleepEpsilon(sleep.epsilon));
        }
        if sleep.base_bias.is_nan() || sleep.base_bias <= 0.0 || sleep.base_bias >= 1.0 {
            return Err(ConfigError::InvalidSleepBias(sleep.base_bias));
        }
        if !non_negative(sleep.wake_speed) {
            return Err(ConfigError::InvalidWakeSpeed(sleep.wake_speed));
        }

        for (name, value) in [
            ("position epsilon", self.solver.position_epsilon),
            ("velocity epsilon", self.solver.velocity_epsilon),
            ("angular move limit", self.solver.angular_move_limit),
        ] {
            if !positive(value) {
                return Err(ConfigError::InvalidSolverTolerance { name, value });
            }
        }
        let limit = self.solver.restitution_velocity_limit;
        if !non_negative(limit) {
            return Err(ConfigError::InvalidSolverLimit {
                name: "restitution velocity limit",
                value: limit,
            });
        }
        if self.solver.iterations_per_contact == 0 || self.solver.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }

        let walls = &self.walls;
        for (name, value) in [
            ("bounce", walls.bounce),
            ("friction", walls.friction),
            ("penalty", walls.penalty),
            ("damping", walls.damping),
        ] {
            if !non_negative(value) {
                return Err(ConfigError::InvalidWallParameter { name, value });
            }
        }
        if !(0.0..=1.0).contains(&walls.elasticity) {
            return Err(ConfigError::InvalidWallElasticity(walls.elasticity));
        }

        let octree = &self.broadphase;
        if !positive(octree.half_size.min_element()) || !octree.center.is_finite() {
            return Err(ConfigError::InvalidOctreeBounds(octree.half_size.to_array()));
        }
        if octree.split_threshold <= octree.merge_threshold {
            return Err(ConfigError::OctreeThresholds {
                split: octree.split_threshold,
                merge: octree.merge_threshold,
            });
        }
        if octree.max_depth == 0 {
            return Err(ConfigError::ZeroOctreeDepth);
        }
        Ok(())
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}
