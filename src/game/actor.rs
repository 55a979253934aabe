//! Actor State
//!
//! The controllable character: position, collider, motion timers and
//! contact flags. [`Actor::tick`] composes the motion integrator and the
//! collision resolver into one fixed step.

use serde::{Serialize, Deserialize};
use tracing::{debug, trace};

use crate::core::aabb::Aabb;
use crate::core::hash::{StateHash, StateHasher, compute_state_hash};
use crate::core::vec2::Vec2;
use crate::game::collision::{CollisionQuery, CollisionResolver, Contacts};
use crate::game::config::{MovementConfig, SimConfig};
use crate::game::events::GameEvent;
use crate::game::input::InputService;
use crate::game::motion::{Facing, MotionIntegrator, MotionState};

// =============================================================================
// ENTER WAY
// =============================================================================

/// How the actor enters a level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EnterWay {
    /// Respawn in place, no forced movement
    #[default]
    Checkpoint = 0,
    /// Walk in from the left edge
    FromLeft = 1,
    /// Walk in from the right edge
    FromRight = 2,
    /// Drop in from above
    FromAbove = 3,
    /// Drop in from above at full fall speed
    SmashFromAbove = 4,
    /// Jump up from below, moving right
    FromBelowLeft = 5,
    /// Jump up from below, moving left
    FromBelowRight = 6,
}

impl EnterWay {
    /// Facing forced on entry, if any.
    pub fn facing(self) -> Option<Facing> {
        match self {
            EnterWay::FromLeft | EnterWay::FromBelowLeft => Some(Facing::Right),
            EnterWay::FromRight | EnterWay::FromBelowRight => Some(Facing::Left),
            EnterWay::Checkpoint | EnterWay::FromAbove | EnterWay::SmashFromAbove => None,
        }
    }

    /// Horizontal input forced while the level-enter timer runs.
    pub fn forced_direction(self) -> f32 {
        self.facing().map_or(0.0, Facing::sign)
    }

    /// Velocity on entry.
    pub fn initial_velocity(self, config: &MovementConfig) -> Vec2 {
        match self {
            EnterWay::FromBelowLeft | EnterWay::FromBelowRight => Vec2::new(0.0, config.jump_speed),
            EnterWay::SmashFromAbove => Vec2::new(0.0, -config.max_fall),
            EnterWay::Checkpoint | EnterWay::FromLeft | EnterWay::FromRight | EnterWay::FromAbove => {
                Vec2::ZERO
            }
        }
    }

    /// Level-enter timer on entry.
    pub fn enter_time(self, config: &MovementConfig) -> f32 {
        match self {
            EnterWay::Checkpoint => 0.0,
            _ => config.level_enter_time,
        }
    }
}

// =============================================================================
// COLLIDER
// =============================================================================

/// Box collider in actor-local space.
///
/// `offset.x` is given for an actor facing right and is mirrored when
/// facing left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Center relative to the actor position
    pub offset: Vec2,
    /// Full width and height
    pub size: Vec2,
}

impl Collider {
    /// Create a collider.
    pub fn new(offset: Vec2, size: Vec2) -> Self {
        Self { offset, size: size.abs() }
    }

    /// World-space box for a position and facing.
    pub fn world_aabb(&self, position: Vec2, facing: Facing) -> Aabb {
        let offset = Vec2::new(self.offset.x * facing.sign(), self.offset.y);
        Aabb::new(position + offset, self.size.scale(0.5))
    }
}

impl Default for Collider {
    /// 0.8 × 1.6 box standing on the actor position.
    fn default() -> Self {
        Self::new(Vec2::new(0.0, 0.8), Vec2::new(0.8, 1.6))
    }
}

// =============================================================================
// TICK REPORT
// =============================================================================

/// Per-tick output for presentation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Tick that produced this report
    pub tick: u64,
    /// Standing on ground after the tick
    pub grounded: bool,
    /// Velocity after collision
    pub velocity: Vec2,
    /// Position after collision
    pub position: Vec2,
    /// Contact flags after the tick
    pub contacts: Contacts,
    /// A corner correction nudged the actor
    pub corrected: bool,
    /// Events raised this tick
    pub events: Vec<GameEvent>,
}

// =============================================================================
// ACTOR
// =============================================================================

/// A controllable character.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Identifier carried on events
    pub id: u32,
    /// World position (collider offset is relative to this)
    pub position: Vec2,
    /// Local collider
    pub collider: Collider,
    /// Velocity, facing and jump timers
    pub motion: MotionState,
    /// How the actor last entered the level
    pub enter_way: EnterWay,
    /// Contact flags from the last tick
    pub contacts: Contacts,
}

impl Actor {
    /// Create an actor entering the level.
    ///
    /// The actor starts airborne until [`Actor::settle`] or the first tick
    /// probes its contacts.
    pub fn new(id: u32, position: Vec2, collider: Collider, enter_way: EnterWay, config: &SimConfig) -> Self {
        let mut actor = Self {
            id,
            position,
            collider,
            motion: MotionState::default(),
            enter_way,
            contacts: Contacts::default(),
        };
        actor.apply_enter_way(enter_way, &config.movement);
        actor
    }

    /// Reset all motion state and re-enter at `position`.
    pub fn respawn(&mut self, position: Vec2, enter_way: EnterWay, config: &SimConfig) {
        debug!(actor = self.id, ?enter_way, "respawn at {}", position);
        self.position = position;
        self.contacts = Contacts::default();
        self.apply_enter_way(enter_way, &config.movement);
    }

    fn apply_enter_way(&mut self, enter_way: EnterWay, config: &MovementConfig) {
        let facing = enter_way.facing().unwrap_or(self.motion.facing);
        self.motion = MotionState {
            velocity: enter_way.initial_velocity(config),
            facing,
            level_enter_timer: enter_way.enter_time(config),
            forced_direction: enter_way.forced_direction(),
            ..MotionState::default()
        };
        self.enter_way = enter_way;
    }

    /// Read contacts at the current position without moving.
    ///
    /// An actor placed on the ground starts grounded, so entering a level
    /// raises no landing event.
    pub fn settle<Q>(&mut self, geometry: &Q, config: &SimConfig)
    where
        Q: CollisionQuery + ?Sized,
    {
        let resolver = CollisionResolver::new(geometry, &config.collision);
        self.contacts = resolver.contacts(self.collider_aabb());
        self.motion.grounded = self.contacts.ground && self.motion.velocity.y <= 0.0;
    }

    /// Current velocity.
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.motion.velocity
    }

    /// Standing on ground.
    #[inline]
    pub fn grounded(&self) -> bool {
        self.motion.grounded
    }

    /// Current facing.
    #[inline]
    pub fn facing(&self) -> Facing {
        self.motion.facing
    }

    /// World-space collider box.
    #[inline]
    pub fn collider_aabb(&self) -> Aabb {
        self.collider.world_aabb(self.position, self.motion.facing)
    }

    /// Run one fixed tick: motion, collision, contacts, events.
    pub fn tick<Q>(&mut self, tick: u64, input: &mut InputService, geometry: &Q, config: &SimConfig) -> TickReport
    where
        Q: CollisionQuery + ?Sized,
    {
        let dt = config.tick_dt();
        let was_grounded = self.motion.grounded;
        let previous_facing = self.motion.facing;

        let outcome = MotionIntegrator::new(&config.movement).integrate(&mut self.motion, input, dt);

        // Mirroring an off-center collider must not push it into a wall
        if self.motion.facing != previous_facing {
            let turned = self.collider_aabb();
            if geometry.overlap(turned.center, turned.half_extents, config.collision.layer_mask) {
                self.motion.facing = previous_facing;
            }
        }

        let impact_speed = (-self.motion.velocity.y).max(0.0);
        let resolver = CollisionResolver::new(geometry, &config.collision);
        let resolution = resolver.resolve(self.collider_aabb(), self.motion.velocity, dt);

        self.position += resolution.displacement;
        self.motion.velocity = resolution.velocity;
        self.contacts = resolver.contacts(self.collider_aabb());
        self.motion.grounded = self.contacts.ground && self.motion.velocity.y <= 0.0;

        let mut events = Vec::new();
        if outcome.jumped {
            debug!(actor = self.id, tick, "jump started");
            events.push(GameEvent::jump_started(tick, self.id));
        }
        if outcome.cancelled {
            debug!(actor = self.id, tick, "jump cancelled");
        }
        if !was_grounded && self.motion.grounded {
            debug!(actor = self.id, tick, impact_speed, "landed");
            events.push(GameEvent::landed(tick, self.id, impact_speed));
        }

        trace!(
            actor = self.id,
            tick,
            position = %self.position,
            velocity = %self.motion.velocity,
            grounded = self.motion.grounded,
            "actor tick"
        );

        TickReport {
            tick,
            grounded: self.motion.grounded,
            velocity: self.motion.velocity,
            position: self.position,
            contacts: self.contacts,
            corrected: resolution.corrected,
            events,
        }
    }

    /// Add actor state to hasher.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        let m = &self.motion;
        hasher.update_u32(self.id);
        hasher.update_vec2(self.position);
        hasher.update_vec2(m.velocity);
        hasher.update_u8(m.facing as u8);
        hasher.update_bool(m.grounded);
        hasher.update_f32(m.jump_grace_timer);
        hasher.update_f32(m.jump_cooldown_timer);
        hasher.update_f32(m.jump_response_timer);
        hasher.update_f32(m.jump_cancel_timer);
        hasher.update_f32(m.level_enter_timer);
        hasher.update_f32(m.forced_direction);
        hasher.update_u8(self.enter_way as u8);
        hasher.update_bool(self.contacts.ground);
        hasher.update_bool(self.contacts.ceiling);
        hasher.update_bool(self.contacts.wall_left);
        hasher.update_bool(self.contacts.wall_right);
    }

    /// State hash at `tick`.
    pub fn compute_hash(&self, tick: u64) -> StateHash {
        compute_state_hash(tick, |hasher| self.hash_into(hasher))
    }
}

// =============================================================================
// TESTS
// =============================================================================
