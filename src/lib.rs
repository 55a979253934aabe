//! # Ledgeline
//!
//! Fixed-timestep kinematic movement and collision core for 2D precision
//! platformers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         LEDGELINE                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Math primitives                           │
//! │  ├── vec2.rs     - 2D vector, axis helpers                   │
//! │  ├── aabb.rs     - Axis-aligned boxes                        │
//! │  └── hash.rs     - State hashing for replay checks           │
//! │                                                              │
//! │  game/           - Simulation (fixed tick)                   │
//! │  ├── config.rs   - Tuning, JSON loading, clamping            │
//! │  ├── input.rs    - Input buffering and recordings            │
//! │  ├── motion.rs   - Gravity, running, jump timing             │
//! │  ├── collision.rs- Swept AABB resolver, corner correction    │
//! │  ├── actor.rs    - Actor state and per-tick orchestration    │
//! │  ├── events.rs   - Events for presentation and audio         │
//! │  └── tick.rs     - Fixed-timestep clock, replay              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Frame-Rate Independence
//!
//! Input is sampled at the render rate but only consumed by the fixed
//! tick. All gameplay state mutates inside the tick, so the same held
//! buttons produce the same motion at 30, 60 or 144 rendered frames per
//! second, and a recorded run replays to the same state hash.
//!
//! Coordinates are +Y up. Gravity pulls toward -Y.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use crate::core::vec2::Vec2;
pub use crate::core::aabb::Aabb;
pub use crate::core::hash::StateHash;
pub use crate::game::actor::{Actor, Collider, EnterWay, TickReport};
pub use crate::game::collision::{CollisionQuery, LayerMask, StaticGeometry, SweepHit};
pub use crate::game::config::SimConfig;
pub use crate::game::events::{EventListener, GameEvent, GameEventData};
pub use crate::game::input::{ButtonId, InputFrame, InputRecording, InputService};
pub use crate::game::tick::{Simulation, Spawn, replay};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Default tick duration in seconds
pub const TICK_DT: f32 = 1.0 / TICK_RATE as f32;
