//! Error types surfaced to hosts.
//!
//! Numerical trouble inside a step is recovered locally and never reaches this
//! module; only configuration that cannot be clamped into shape is reported.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("timestep must be positive and finite, got {0}")]
    InvalidTimestep(f32),
    #[error("max frame time {max_frame_time} is shorter than the timestep {timestep}")]
    FrameTimeBelowTimestep { max_frame_time: f32, timestep: f32 },
    #[error("gravity must be finite, got {0:?}")]
    NonFiniteGravity([f32; 3]),
    #[error("sleep epsilon must be positive, got {0}")]
    InvalidSleepEpsilon(f32),
    #[error("sleep base bias must lie in (0, 1), got {0}")]
    InvalidSleepBias(f32),
    #[error("sleep wake speed must be non-negative, got {0}")]
    InvalidWakeSpeed(f32),
    #[error("solver {name} must be positive, got {value}")]
    InvalidSolverTolerance { name: &'static str, value: f32 },
    #[error("solver {name} must be non-negative, got {value}")]
    InvalidSolverLimit { name: &'static str, value: f32 },
    #[error("wall {name} must be non-negative, got {value}")]
    InvalidWallParameter { name: &'static str, value: f32 },
    #[error("wall elasticity must lie in [0, 1], got {0}")]
    InvalidWallElasticity(f32),
    #[error("solver iteration budget must be at least one")]
    ZeroIterations,
    #[error("octree half size must be positive, got {0:?}")]
    InvalidOctreeBounds([f32; 3]),
    #[error("octree split threshold {split} must exceed merge threshold {merge}")]
    OctreeThresholds { split: usize, merge: usize },
    #[error("octree max depth must be at least one")]
    ZeroOctreeDepth,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
