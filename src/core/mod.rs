//! Body records, per-step collider snapshots and material helpers.

pub mod collider;
pub mod rigidbody;
pub mod types;

pub use collider::OrientedBox;
pub use rigidbody::RigidBody;
pub use types::{InertiaTensorExt, Material, MaterialPair};
