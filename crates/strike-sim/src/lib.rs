//! Simulation engine for StrikeEngine.
//!
//! Owns the component registry, runs the system dependency graph at a fixed
//! timestep on a worker job pool, and provides the data services (atmosphere
//! table, signature databases), entity factory, and scenario loader that the
//! systems consume. Completely headless, enabling deterministic testing.

pub mod atmosphere;
pub mod engine;
pub mod error;
pub mod factory;
pub mod flight;
pub mod graph;
pub mod jobs;
pub mod scenario;
pub mod snapshot;
pub mod systems;

pub use engine::{Engine, EngineConfig};
pub use error::SimError;

#[cfg(test)]
mod tests;
