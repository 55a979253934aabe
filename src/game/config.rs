//! Simulation Configuration
//!
//! Tuning values for movement, collision and input buffering.
//! Every struct has working defaults and loads from JSON with missing
//! fields falling back to those defaults.
//!
//! Invalid values are never rejected: [`SimConfig::sanitized`] clamps them
//! into range and logs what it changed.

use std::path::Path;
use serde::{Serialize, Deserialize};
use tracing::warn;

use crate::game::collision::LayerMask;
use crate::TICK_RATE;

/// Environment variable naming a JSON config file for the demo binary.
pub const CONFIG_ENV_VAR: &str = "LEDGELINE_CONFIG";

/// Configuration errors. Only raised while reading or parsing a file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Path that was read
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Config JSON is malformed.
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

// =============================================================================
// MOVEMENT
// =============================================================================

/// Run, gravity and jump tuning. Distances in world units, times in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Horizontal speed at full input
    pub max_run: f32,
    /// Acceleration toward the target run speed (units/s²)
    pub run_accel: f32,
    /// Deceleration toward zero with no input (units/s²)
    pub run_reduce: f32,
    /// Multiplier on `run_accel` while airborne
    pub air_mult: f32,
    /// Downward acceleration (units/s²)
    pub gravity: f32,
    /// Below this |vy| gravity is halved (apex float)
    pub half_grav_threshold: f32,
    /// Maximum downward speed (positive number)
    pub max_fall: f32,
    /// Vertical velocity set on takeoff
    pub jump_speed: f32,
    /// Horizontal velocity added on takeoff
    pub jump_x_boost: f32,
    /// Coyote window after leaving the ground
    pub jump_grace_time: f32,
    /// Minimum time between two jumps
    pub jump_cooldown: f32,
    /// Window after takeoff in which a release always cancels
    pub jump_response_time: f32,
    /// Window after takeoff in which a release cancels while rising
    pub jump_allow_cancel_time: f32,
    /// Duration of forced movement after entering a level
    pub level_enter_time: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_run: 9.0,
            run_accel: 100.0,
            run_reduce: 40.0,
            air_mult: 0.65,
            gravity: 90.0,
            half_grav_threshold: 4.0,
            max_fall: 16.0,
            jump_speed: 10.5,
            jump_x_boost: 4.0,
            jump_grace_time: 0.1,
            jump_cooldown: 0.2,
            jump_response_time: 0.05,
            jump_allow_cancel_time: 0.25,
            level_enter_time: 0.3,
        }
    }
}

impl MovementConfig {
    /// Replace non-finite values with defaults and clamp the rest to be
    /// non-negative.
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        for (name, value, default) in [
            ("max_run", &mut self.max_run, d.max_run),
            ("run_accel", &mut self.run_accel, d.run_accel),
            ("run_reduce", &mut self.run_reduce, d.run_reduce),
            ("air_mult", &mut self.air_mult, d.air_mult),
            ("gravity", &mut self.gravity, d.gravity),
            ("half_grav_threshold", &mut self.half_grav_threshold, d.half_grav_threshold),
            ("max_fall", &mut self.max_fall, d.max_fall),
            ("jump_speed", &mut self.jump_speed, d.jump_speed),
            ("jump_x_boost", &mut self.jump_x_boost, d.jump_x_boost),
            ("jump_grace_time", &mut self.jump_grace_time, d.jump_grace_time),
            ("jump_cooldown", &mut self.jump_cooldown, d.jump_cooldown),
            ("jump_response_time", &mut self.jump_response_time, d.jump_response_time),
            ("jump_allow_cancel_time", &mut self.jump_allow_cancel_time, d.jump_allow_cancel_time),
            ("level_enter_time", &mut self.level_enter_time, d.level_enter_time),
        ] {
            *value = sanitize_value(name, *value, default);
        }
        self
    }
}

// =============================================================================
// COLLISION
// =============================================================================

/// Sweep and corner-correction tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Skin kept between the collider and geometry
    pub deviation_margin: f32,
    /// Extra reach of the ground / wall / ceiling contact probes
    pub contact_distance: f32,
    /// Corner correction strength; the probe walks `5 ×` this many steps
    pub upward_corner_correction: u32,
    /// Lateral distance between two corner probes
    pub corner_probe_step: f32,
    /// Successful corrections allowed per axis move
    pub correction_iterations: u32,
    /// Geometry layers the actor collides with
    pub layer_mask: LayerMask,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            deviation_margin: 0.01,
            contact_distance: 0.01,
            upward_corner_correction: 4,
            corner_probe_step: 0.01,
            correction_iterations: 1,
            layer_mask: LayerMask::SOLID,
        }
    }
}

impl CollisionConfig {
    /// Number of lateral probes tried by corner correction.
    #[inline]
    pub fn corner_probe_count(&self) -> u32 {
        self.upward_corner_correction.saturating_mul(5)
    }

    /// Replace non-finite values with defaults and clamp the rest to be
    /// non-negative.
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        self.deviation_margin = sanitize_value("deviation_margin", self.deviation_margin, d.deviation_margin);
        self.contact_distance = sanitize_value("contact_distance", self.contact_distance, d.contact_distance);
        self.corner_probe_step = sanitize_value("corner_probe_step", self.corner_probe_step, d.corner_probe_step);
        self
    }
}

// =============================================================================
// INPUT
// =============================================================================

/// Input buffering windows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// How long a jump press is remembered before it can take effect
    pub jump_pre_input: f32,
    /// How long a consumed jump still reads as held
    pub jump_min_hold: f32,
    /// Pre-input window for every other button
    pub default_pre_input: f32,
    /// Min-hold window for every other button
    pub default_min_hold: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            jump_pre_input: 0.1,
            jump_min_hold: 0.1,
            default_pre_input: 0.0,
            default_min_hold: 0.0,
        }
    }
}

impl InputConfig {
    /// Replace non-finite values with defaults and clamp the rest to be
    /// non-negative.
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        self.jump_pre_input = sanitize_value("jump_pre_input", self.jump_pre_input, d.jump_pre_input);
        self.jump_min_hold = sanitize_value("jump_min_hold", self.jump_min_hold, d.jump_min_hold);
        self.default_pre_input = sanitize_value("default_pre_input", self.default_pre_input, d.default_pre_input);
        self.default_min_hold = sanitize_value("default_min_hold", self.default_min_hold, d.default_min_hold);
        self
    }
}

// =============================================================================
// SIMULATION
// =============================================================================

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed ticks per second
    pub tick_rate: u32,
    /// Most ticks a single rendered frame may run before time is dropped
    pub max_ticks_per_frame: u32,
    /// Movement tuning
    pub movement: MovementConfig,
    /// Collision tuning
    pub collision: CollisionConfig,
    /// Input tuning
    pub input: InputConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            max_ticks_per_frame: 8,
            movement: MovementConfig::default(),
            collision: CollisionConfig::default(),
            input: InputConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse from JSON. Missing fields use defaults; the result is sanitized.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Load from the file named by [`CONFIG_ENV_VAR`], or defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::load(path),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Fixed tick duration in seconds.
    #[inline]
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Clamp all nested values into range.
    pub fn sanitized(mut self) -> Self {
        if self.tick_rate == 0 {
            warn!("tick_rate 0 is invalid, using {}", TICK_RATE);
            self.tick_rate = TICK_RATE;
        }
        if self.max_ticks_per_frame == 0 {
            warn!("max_ticks_per_frame 0 is invalid, using 1");
            self.max_ticks_per_frame = 1;
        }
        self.movement = self.movement.sanitized();
        self.collision = self.collision.sanitized();
        self.input = self.input.sanitized();
        self
    }
}

fn sanitize_value(name: &str, value: f32, default: f32) -> f32 {
    if !value.is_finite() {
        warn!("config value {} = {} is not finite, using {}", name, value, default);
        return default;
    }
    if value < 0.0 {
        warn!("config value {} = {} clamped to 0", name, value);
        return 0.0;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = SimConfig::default();
        assert_eq!(config.tick_rate, TICK_RATE);
        assert!((config.tick_dt() - 1.0 / 60.0).abs() < 1e-7);
        assert_eq!(config.collision.corner_probe_count(), 20);
        assert_eq!(config.collision.correction_iterations, 1);
        assert_eq!(config.clone().sanitized(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimConfig::from_json_str(r#"{ "movement": { "jump_speed": 12.0 } }"#).unwrap();
        assert_eq!(config.movement.jump_speed, 12.0);
        assert_eq!(config.movement.max_run, MovementConfig::default().max_run);
        assert_eq!(config.collision, CollisionConfig::default());
    }

    #[test]
    fn test_negative_values_are_clamped() {
        let config = SimConfig::from_json_str(
            r#"{ "tick_rate": 0, "movement": { "jump_cooldown": -1.0 }, "input": { "jump_pre_input": -0.5 } }"#,
        )
        .unwrap();
        assert_eq!(config.tick_rate, TICK_RATE);
        assert_eq!(config.movement.jump_cooldown, 0.0);
        assert_eq!(config.input.jump_pre_input, 0.0);
    }

    #[test]
    fn test_non_finite_values_fall_back_to_defaults() {
        let mut config = SimConfig::default();
        config.movement.max_fall = f32::INFINITY;
        config.movement.gravity = f32::NAN;
        config.collision.deviation_margin = f32::NEG_INFINITY;
        config.input.jump_min_hold = f32::INFINITY;

        let config = config.sanitized();
        let defaults = SimConfig::default();
        assert_eq!(config.movement.max_fall, defaults.movement.max_fall);
        assert_eq!(config.movement.gravity, defaults.movement.gravity);
        assert_eq!(config.collision.deviation_margin, defaults.collision.deviation_margin);
        assert_eq!(config.input.jump_min_hold, defaults.input.jump_min_hold);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = SimConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = SimConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
