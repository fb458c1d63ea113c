//! Utility helpers: generational arena, math extensions, logging and profiling.

pub mod allocator;
pub mod logging;
pub mod math;
pub mod profiling;

pub use allocator::{Arena, EntityId};
pub use profiling::StepProfile;
