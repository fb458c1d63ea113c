//! Collision detection: octree broad phase, separating-axis narrow phase,
//! clipping, contact generation and static walls.

pub mod broadphase;
pub mod clipping;
pub mod contact;
pub mod narrowphase;
pub mod wall;

pub use broadphase::{BodyProxy, Octree};
pub use contact::{ContactGenerator, ContactManifold, ContactPoint};
pub use narrowphase::{CollisionInfo, SeparatingAxisTest};
pub use wall::{Wall, WallResponse, WallSolver};
