//! Core types and definitions for the StrikeEngine simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! components, enums, constants, and fundamental types. It carries no
//! runtime machinery; game logic lives in the systems of `strike-sim`.

pub mod components;
pub mod constants;
pub mod enums;
pub mod interp;
pub mod types;

pub use types::{Mat3, Quat, SimTime, Vec3};
