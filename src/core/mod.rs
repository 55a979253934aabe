//! Core math primitives.
//!
//! Vectors, boxes and the state hasher shared by the simulation.

pub mod vec2;
pub mod aabb;
pub mod hash;

// Re-export core types
pub use vec2::{Vec2, Axis, sign, approach};
pub use aabb::Aabb;
pub use hash::{StateHash, StateHasher, compute_state_hash};
