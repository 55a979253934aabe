//! Fixed-Timestep Simulation
//!
//! Drives one actor from variable-rate rendered frames.
//!
//! ```text
//! frame(input, dt) ──► sample ──► accumulator += dt
//!                                   │
//!                    while accumulator >= TICK_DT (capped)
//!                                   │
//!                   fixed_update ──► record ──► Actor::tick ──► listeners
//! ```
//!
//! Recordings store the consolidated input each tick actually consumed, so
//! [`replay`] reproduces a run regardless of the frame rate it was played at.

use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::core::hash::StateHash;
use crate::core::vec2::Vec2;
use crate::game::actor::{Actor, Collider, EnterWay, TickReport};
use crate::game::collision::StaticGeometry;
use crate::game::config::SimConfig;
use crate::game::events::EventListener;
use crate::game::input::{InputFrame, InputRecording, InputService};

/// Slack when comparing accumulated frame time against the tick length.
const ACCUMULATOR_EPSILON: f64 = 1e-9;

/// Where and how the actor enters the level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spawn {
    /// Actor id carried on events
    pub actor_id: u32,
    /// Spawn position
    pub position: Vec2,
    /// Actor collider
    pub collider: Collider,
    /// Entry behaviour
    pub enter_way: EnterWay,
}

impl Spawn {
    /// Checkpoint spawn with the default collider.
    pub fn at(position: Vec2) -> Self {
        Self {
            actor_id: 0,
            position,
            collider: Collider::default(),
            enter_way: EnterWay::Checkpoint,
        }
    }

    /// Builder: entry behaviour.
    pub fn entering(mut self, enter_way: EnterWay) -> Self {
        self.enter_way = enter_way;
        self
    }
}

/// Single-actor simulation with a fixed-timestep clock.
pub struct Simulation {
    config: SimConfig,
    geometry: StaticGeometry,
    spawn: Spawn,
    input: InputService,
    actor: Actor,
    tick: u64,
    accumulator: f64,
    recording: InputRecording,
    listeners: Vec<Box<dyn EventListener>>,
}

impl Simulation {
    /// Create a simulation. The config is sanitized first.
    pub fn new(config: SimConfig, geometry: StaticGeometry, spawn: Spawn) -> Self {
        let config = config.sanitized();
        let input = InputService::new(&config.input);
        let mut actor = Actor::new(spawn.actor_id, spawn.position, spawn.collider, spawn.enter_way, &config);
        actor.settle(&geometry, &config);
        Self {
            config,
            geometry,
            spawn,
            input,
            actor,
            tick: 0,
            accumulator: 0.0,
            recording: InputRecording::new(spawn.actor_id),
            listeners: Vec::new(),
        }
    }

    /// Register an event listener.
    pub fn add_listener(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }

    /// Fixed tick length in seconds.
    fn tick_seconds(&self) -> f64 {
        1.0 / f64::from(self.config.tick_rate.max(1))
    }

    /// Feed one rendered frame.
    ///
    /// Samples input, then runs every fixed tick the elapsed time allows,
    /// up to `max_ticks_per_frame`. Time beyond the cap is dropped.
    pub fn frame(&mut self, frame: &InputFrame, frame_dt: f64) -> Vec<TickReport> {
        self.input.sample(frame);

        if !frame_dt.is_finite() || frame_dt < 0.0 {
            warn!("ignoring invalid frame time {}", frame_dt);
            return Vec::new();
        }

        self.accumulator += frame_dt;
        let tick_seconds = self.tick_seconds();
        let max_ticks = self.config.max_ticks_per_frame as usize;

        let mut reports = Vec::new();
        while self.accumulator + ACCUMULATOR_EPSILON >= tick_seconds {
            if reports.len() >= max_ticks {
                warn!(
                    tick = self.tick,
                    dropped_seconds = self.accumulator,
                    "frame exceeded {} ticks, dropping time",
                    max_ticks
                );
                self.accumulator = 0.0;
                break;
            }
            self.accumulator -= tick_seconds;
            reports.push(self.run_tick());
        }
        reports
    }

    /// Sample one frame and run exactly one tick, ignoring the clock.
    pub fn step(&mut self, frame: &InputFrame) -> TickReport {
        self.input.sample(frame);
        self.run_tick()
    }

    fn run_tick(&mut self) -> TickReport {
        self.tick += 1;
        self.input.fixed_update(self.config.tick_dt());
        self.recording.record(self.tick, self.input.tick_frame());

        let report = self.actor.tick(self.tick, &mut self.input, &self.geometry, &self.config);
        for event in &report.events {
            for listener in &mut self.listeners {
                listener.on_event(event);
            }
        }
        report
    }

    /// Reload the level: fresh actor, input, clock and recording.
    pub fn respawn(&mut self, spawn: Spawn) {
        debug!(tick = self.tick, "level reload");
        self.spawn = spawn;
        self.input.reset();
        self.actor = Actor::new(spawn.actor_id, spawn.position, spawn.collider, spawn.enter_way, &self.config);
        self.actor.settle(&self.geometry, &self.config);
        self.tick = 0;
        self.accumulator = 0.0;
        self.recording = InputRecording::new(spawn.actor_id);
    }

    /// Ticks run since the last (re)spawn.
    #[inline]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// The simulated actor.
    #[inline]
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Input state.
    #[inline]
    pub fn input(&self) -> &InputService {
        &self.input
    }

    /// Active config.
    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Level geometry.
    #[inline]
    pub fn geometry(&self) -> &StaticGeometry {
        &self.geometry
    }

    /// Spawn of the current run.
    #[inline]
    pub fn spawn(&self) -> Spawn {
        self.spawn
    }

    /// Inputs consumed since the last (re)spawn.
    #[inline]
    pub fn recording(&self) -> &InputRecording {
        &self.recording
    }

    /// Hash of the actor state at the current tick.
    pub fn state_hash(&self) -> StateHash {
        self.actor.compute_hash(self.tick)
    }
}

/// Replay a recording from `spawn` and return the final state hash.
pub fn replay(config: SimConfig, geometry: StaticGeometry, spawn: Spawn, recording: &InputRecording) -> StateHash {
    let mut sim = Simulation::new(config, geometry, spawn);
    for (_, frame) in recording.replay_iter() {
        sim.step(&frame);
    }
    sim.state_hash()
}
