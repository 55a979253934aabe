//! Game Events
//!
//! Events raised during a tick for presentation, audio and verification.
//! The simulation never waits on a listener; delivery is fire-and-forget.

use serde::{Serialize, Deserialize};

/// Event payload.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Actor landed; `speed` is the downward speed just before the block.
    LandedWithImpactSpeed {
        /// Positive downward speed
        speed: f32,
    },

    /// Actor left the ground with a jump impulse.
    JumpStarted,
}

/// An event with timing and the actor that raised it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when the event occurred
    pub tick: u64,
    /// Actor that raised it
    pub actor_id: u32,
    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u64, actor_id: u32, data: GameEventData) -> Self {
        Self { tick, actor_id, data }
    }

    /// Create jump started event.
    pub fn jump_started(tick: u64, actor_id: u32) -> Self {
        Self::new(tick, actor_id, GameEventData::JumpStarted)
    }

    /// Create landed event.
    pub fn landed(tick: u64, actor_id: u32, speed: f32) -> Self {
        Self::new(tick, actor_id, GameEventData::LandedWithImpactSpeed { speed })
    }
}

/// Receives events as ticks complete.
pub trait EventListener {
    /// Called once per event, in tick order.
    fn on_event(&mut self, event: &GameEvent);
}

impl<F: FnMut(&GameEvent)> EventListener for F {
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}
