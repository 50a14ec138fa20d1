//! Entity-component storage for the StrikeEngine simulation core.
//!
//! The registry is a heterogeneous collection of typed component pools keyed
//! by opaque generational entity handles. Pools are densely packed with
//! swap-and-pop removal, so per-component iteration is contiguous. Each pool
//! sits behind its own reader-writer lock: systems running concurrently in a
//! scheduler stage partition the registry by component kind, never by entity.

pub mod entity;
pub mod pool;
pub mod registry;

pub use entity::{Entity, EntityAllocator};
pub use pool::SparseSet;
pub use registry::Registry;
