//! OBB Dynamics – oriented-box rigid-body kernel for Rust.
//!
//! The crate advances a set of oriented boxes through a fixed-step pipeline:
//! octree broad phase, fifteen-axis separating-axis narrow phase, clipped
//! contact generation, a sequential-impulse resolver with friction and
//! restitution, penalty walls, RK4 integration and an activity-based sleep
//! model. [`PhysicsEngine`] is the smallest way in; [`PhysicsWorld`] exposes
//! every stage.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::{Mat3, Quat, Vec2, Vec3};

pub use collision::{
    broadphase::Octree,
    contact::{ContactGenerator, ContactManifold},
    narrowphase::{CollisionInfo, SeparatingAxisTest},
    wall::{Wall, WallSolver},
};
pub use config::{SimulationConfig, SleepConfig, SolverConfig, WallMaterial};
pub use core::{collider::OrientedBox, rigidbody::RigidBody, types::Material};
pub use dynamics::{
    forces::{FieldOfInfluence, ForceContributor, ForceGenerator},
    integrator::Integrator,
    solver::{Contact, ContactResolver},
};
pub use error::{ConfigError, ConfigResult};
pub use utils::allocator::{Arena, EntityId};
pub use world::{PhysicsWorld, StepReport};

/// High-level convenience wrapper that owns a [`PhysicsWorld`].
#[derive(Debug, Default)]
pub struct PhysicsEngine {
    world: PhysicsWorld,
}

impl PhysicsEngine {
    /// Creates an engine with default settings and the provided fixed timestep.
    pub fn new(timestep: f32) -> Self {
        Self {
            world: PhysicsWorld::new(timestep),
        }
    }

    /// Creates an engine from a validated configuration.
    pub fn with_config(config: SimulationConfig) -> ConfigResult<Self> {
        Ok(Self {
            world: PhysicsWorld::with_config(config)?,
        })
    }

    /// Adds a rigid body to the world and returns its generated [`EntityId`].
    pub fn add_body(&mut self, body: RigidBody) -> EntityId {
        self.world.add_body(body)
    }

    pub fn add_wall(&mut self, wall: Wall) {
        self.world.add_wall(wall);
    }

    /// Advances the simulation by one host frame.
    pub fn step(&mut self, frame_dt: f32) -> StepReport {
        self.world.step(frame_dt)
    }

    pub fn get_body(&self, id: EntityId) -> Option<&RigidBody> {
        self.world.body(id)
    }

    pub fn get_body_mut(&mut self, id: EntityId) -> Option<&mut RigidBody> {
        self.world.body_mut(id)
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }
}
