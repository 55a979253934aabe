//! Game Logic Module
//!
//! Everything that runs inside the fixed tick.
//!
//! ## Module Structure
//!
//! - `config`: Tuning values and config loading
//! - `input`: Input buffering, pre-input and min-hold windows, recordings
//! - `motion`: Velocity integration and jump state machine
//! - `collision`: Sweep queries, movement resolution, corner correction
//! - `actor`: Actor state, level entry, per-tick orchestration
//! - `events`: Events for presentation, audio and replay checks
//! - `tick`: Fixed-timestep simulation loop

pub mod config;
pub mod input;
pub mod motion;
pub mod collision;
pub mod actor;
pub mod events;
pub mod tick;

// Re-export key types
pub use config::{SimConfig, MovementConfig, CollisionConfig, InputConfig, ConfigError};
pub use input::{Button, ButtonId, InputFrame, InputService, InputRecording, RecordingError};
pub use motion::{Facing, MotionIntegrator, MotionState};
pub use collision::{CollisionQuery, CollisionResolver, Contacts, LayerMask, StaticGeometry, SweepHit};
pub use actor::{Actor, Collider, EnterWay, TickReport};
pub use events::{EventListener, GameEvent, GameEventData};
pub use tick::{Simulation, Spawn};
