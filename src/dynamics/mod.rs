//! Simulation dynamics: force contributors, integration, contact batching,
//! impulse resolution and the sleep model.

pub mod forces;
pub mod integrator;
pub mod island;
pub mod sleep;
pub mod solver;

pub use forces::{FieldOfInfluence, ForceContributor, ForceGenerator};
pub use integrator::{IntegrationOutcome, Integrator};
pub use island::{ContactBatch, ContactBatcher};
pub use sleep::SleepModel;
pub use solver::{Contact, ContactResolver, ResolutionStats};
