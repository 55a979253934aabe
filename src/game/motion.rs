//! Motion Integration
//!
//! Turns buffered input and jump timers into a velocity for the tick.
//!
//! ## Jump windows
//!
//! ```text
//!  grounded ──────┐ leaves ledge
//!  grace    ██████████░░░░          coyote: jump still accepted
//!  cooldown             ████████    blocks re-trigger after a jump
//!  cancel               ██████      release while rising zeroes vy
//!                       ^ takeoff
//! ```
//!
//! The integrator never touches geometry. It only produces the velocity
//! the collision resolver will try to realise.

use serde::{Serialize, Deserialize};
use tracing::trace;

use crate::core::vec2::{Vec2, approach, sign};
use crate::game::config::MovementConfig;
use crate::game::input::{ButtonId, InputService};

/// Horizontal facing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Facing -X
    Left,
    /// Facing +X
    #[default]
    Right,
}

impl Facing {
    /// -1.0 or +1.0
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Facing for a non-zero horizontal value.
    #[inline]
    pub fn from_sign(value: f32) -> Option<Self> {
        if value > 0.0 {
            Some(Facing::Right)
        } else if value < 0.0 {
            Some(Facing::Left)
        } else {
            None
        }
    }
}

/// Velocity, facing and timers mutated by the integrator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    /// Current velocity
    pub velocity: Vec2,
    /// Current facing
    pub facing: Facing,
    /// Standing on ground at the end of the previous tick
    pub grounded: bool,
    /// Coyote window remaining
    pub jump_grace_timer: f32,
    /// Time until another jump may trigger
    pub jump_cooldown_timer: f32,
    /// Release inside this window always cancels a rising jump
    pub jump_response_timer: f32,
    /// Release inside this window cancels a rising jump
    pub jump_cancel_timer: f32,
    /// Level-entry forced movement remaining
    pub level_enter_timer: f32,
    /// Forced horizontal input during level entry (-1, 0 or +1)
    pub forced_direction: f32,
}

/// What happened during integration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionOutcome {
    /// A jump triggered this tick
    pub jumped: bool,
    /// A rising jump was cut short this tick
    pub cancelled: bool,
}

/// Advances velocity from gravity, run input and jumps.
pub struct MotionIntegrator<'a> {
    config: &'a MovementConfig,
}

impl<'a> MotionIntegrator<'a> {
    /// Bind tuning.
    pub fn new(config: &'a MovementConfig) -> Self {
        Self { config }
    }

    /// Run one fixed tick of motion.
    ///
    /// Consumes the jump press through `input` when a jump triggers.
    pub fn integrate(&self, state: &mut MotionState, input: &mut InputService, dt: f32) -> MotionOutcome {
        self.update_timers(state, dt);

        let move_x = self.move_input(state, input);
        self.integrate_horizontal(state, move_x, dt);
        self.integrate_vertical(state, dt);

        let mut outcome = MotionOutcome::default();
        if self.try_jump(state, input, move_x) {
            outcome.jumped = true;
        } else {
            outcome.cancelled = self.try_cancel(state, input);
        }
        outcome
    }

    /// Grace refills on the ground; everything else counts down.
    pub fn update_timers(&self, state: &mut MotionState, dt: f32) {
        let tick = |t: f32| (t - dt).max(0.0);

        state.jump_grace_timer = if state.grounded {
            self.config.jump_grace_time
        } else {
            tick(state.jump_grace_timer)
        };
        state.jump_cooldown_timer = tick(state.jump_cooldown_timer);
        state.jump_response_timer = tick(state.jump_response_timer);
        state.jump_cancel_timer = tick(state.jump_cancel_timer);
        state.level_enter_timer = tick(state.level_enter_timer);
    }

    /// Horizontal intent in [-1, 1], overridden during level entry.
    fn move_input(&self, state: &MotionState, input: &InputService) -> f32 {
        if state.level_enter_timer > 0.0 && state.forced_direction != 0.0 {
            return state.forced_direction;
        }
        input.axis().x.clamp(-1.0, 1.0)
    }

    fn integrate_horizontal(&self, state: &mut MotionState, move_x: f32, dt: f32) {
        let c = self.config;
        let vx = state.velocity.x;

        state.velocity.x = if move_x != 0.0 {
            let accel = if state.grounded { c.run_accel } else { c.run_accel * c.air_mult };
            approach(vx, move_x * c.max_run, accel * dt)
        } else {
            approach(vx, 0.0, c.run_reduce * dt)
        };

        if let Some(facing) = Facing::from_sign(move_x) {
            state.facing = facing;
        }
    }

    fn integrate_vertical(&self, state: &mut MotionState, dt: f32) {
        let c = self.config;
        let vy = state.velocity.y;

        // Floaty apex
        let gravity = if vy.abs() < c.half_grav_threshold {
            c.gravity * 0.5
        } else {
            c.gravity
        };
        state.velocity.y = (vy - gravity * dt).max(-c.max_fall);
    }

    fn try_jump(&self, state: &mut MotionState, input: &mut InputService, move_x: f32) -> bool {
        let c = self.config;
        let can_jump = state.jump_grace_timer > 0.0 && state.jump_cooldown_timer <= 0.0;
        if !can_jump || !input.button(ButtonId::Jump).pressed_fixed() {
            return false;
        }

        input.button_mut(ButtonId::Jump).on_trigger();

        state.jump_cooldown_timer = c.jump_cooldown;
        state.jump_grace_timer = 0.0;
        state.jump_response_timer = c.jump_response_time;
        state.jump_cancel_timer = c.jump_allow_cancel_time;
        state.grounded = false;

        let boost_dir = if move_x != 0.0 { sign(move_x) } else { state.facing.sign() };
        state.velocity.y = c.jump_speed;
        state.velocity.x += c.jump_x_boost * boost_dir;

        trace!(velocity = ?state.velocity, "jump impulse");
        true
    }

    fn try_cancel(&self, state: &mut MotionState, input: &InputService) -> bool {
        let in_window = state.jump_response_timer > 0.0 || state.jump_cancel_timer > 0.0;
        let released = !input.button(ButtonId::Jump).checked_fixed();
        if !(in_window && released && state.velocity.y > 0.0) {
            return false;
        }

        state.velocity.y = 0.0;
        state.jump_response_timer = 0.0;
        state.jump_cancel_timer = 0.0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::InputConfig;
    use crate::game::input::InputFrame;

    const DT: f32 = 1.0 / 60.0;

    fn input_with(config: InputConfig) -> InputService {
        InputService::new(&config)
    }

    fn feed(input: &mut InputService, frame: InputFrame) {
        input.sample(&frame);
        input.fixed_update(DT);
    }

    fn jump_frame() -> InputFrame {
        InputFrame::with_buttons(&[ButtonId::Jump])
    }

    fn grounded_state() -> MotionState {
        MotionState {
            grounded: true,
            ..MotionState::default()
        }
    }

    #[test]
    fn test_jump_from_rest() {
        let config = MovementConfig::default();
        let integrator = MotionIntegrator::new(&config);
        let mut input = input_with(InputConfig::default());
        let mut state = grounded_state();
        state.jump_grace_timer = config.jump_grace_time;

        feed(&mut input, jump_frame());
        let outcome = integrator.integrate(&mut state, &mut input, DT);

        assert!(outcome.jumped);
        assert_eq!(state.velocity.y, config.jump_speed);
        assert_eq!(state.jump_cooldown_timer, config.jump_cooldown);
        assert_eq!(state.jump_grace_timer, 0.0);
        assert_eq!(state.jump_response_timer, config.jump_response_time);
        assert!(!state.grounded);
        // Standing still facing right: boost follows facing
        assert_eq!(state.velocity.x, config.jump_x_boost);
        // The press was consumed: the edge lasts this tick, the buffer is empty
        assert!(!input.button(ButtonId::Jump).buffered());
        feed(&mut input, jump_frame());
        assert!(!input.button(ButtonId::Jump).pressed_fixed());
    }

    #[test]
    fn test_jump_boost_follows_input() {
        let config = MovementConfig::default();
        let integrator = MotionIntegrator::new(&config);
        let mut input = input_with(InputConfig::default());
        let mut state = grounded_state();

        feed(&mut input, jump_frame().pressing(ButtonId::Left));
        integrator.integrate(&mut state, &mut input, DT);

        let run = -config.run_accel * DT;
        assert!((state.velocity.x - (run - config.jump_x_boost)).abs() < 1e-5);
        assert_eq!(state.facing, Facing::Left);
    }

    #[test]
    fn test_no_jump_without_grace() {
        let config = MovementConfig::default();
        let integrator = MotionIntegrator::new(&config);
        let mut input = input_with(InputConfig::default());
        let mut state = MotionState::default();

        feed(&mut input, jump_frame());
        let outcome = integrator.integrate(&mut state, &mut input, DT);
        assert!(!outcome.jumped);
        assert!(state.velocity.y < 0.0);
        // Press stays buffered for later
        assert!(input.button(ButtonId::Jump).pressed_fixed());
    }

    #[test]
    fn test_coyote_time() {
        let config = MovementConfig::default();
        let integrator = MotionIntegrator::new(&config);
        let mut input = input_with(InputConfig::default());
        let mut state = grounded_state();

        // One grounded tick fills grace, then walk off the ledge
        feed(&mut input, InputFrame::new());
        integrator.integrate(&mut state, &mut input, DT);
        state.grounded = false;
        for _ in 0..3 {
            feed(&mut input, InputFrame::new());
            integrator.integrate(&mut state, &mut input, DT);
        }
        assert!(state.jump_grace_timer > 0.0);

        feed(&mut input, jump_frame());
        assert!(integrator.integrate(&mut state, &mut input, DT).jumped);
    }

    #[test]
    fn test_coyote_time_expires() {
        let config = MovementConfig::default();
        let integrator = MotionIntegrator::new(&config);
        let mut input = input_with(InputConfig::default());
        let mut state = grounded_state();

        feed(&mut input, InputFrame::new());
        integrator.integrate(&mut state, &mut input, DT);
        state.grounded = false;
        for _ in 0..10 {
            feed(&mut input, InputFrame::new());
            integrator.integrate(&mut state, &mut input, DT);
        }
        assert_eq!(state.jump_grace_timer, 0.0);

        feed(&mut input, jump_frame());
        assert!(!integrator.integrate(&mut state, &mut input, DT).jumped);
    }

    #[test]
    fn test_cooldown_blocks_retrigger() {
        let config = MovementConfig::default();
        let integrator = MotionIntegrator::new(&config);
        let mut input = input_with(InputConfig::default());
        let mut state = grounded_state();

        feed(&mut input, jump_frame());
        assert!(integrator.integrate(&mut state, &mut input, DT).jumped);

        let mut second_jump = None;
        for tick in 1..40u32 {
            // Keep grounded and keep producing fresh presses
            state.grounded = true;
            let frame = if tick % 2 == 0 { jump_frame() } else { InputFrame::new() };
            feed(&mut input, frame);
            if integrator.integrate(&mut state, &mut input, DT).jumped {
                second_jump = Some(tick);
                break;
            }
        }

        let tick = second_jump.expect("second jump after cooldown");
        assert!(tick as f32 * DT >= config.jump_cooldown - 1e-5, "jumped at tick {tick}");
    }

    #[test]
    fn test_release_cancels_rising_jump() {
        let config = MovementConfig::default();
        let integrator = MotionIntegrator::new(&config);
        let mut input = input_with(InputConfig {
            jump_min_hold: 0.0,
            ..InputConfig::default()
        });
        let mut state = grounded_state();

        feed(&mut input, jump_frame());
        integrator.integrate(&mut state, &mut input, DT);

        feed(&mut input, InputFrame::new());
        let outcome = integrator.integrate(&mut state, &mut input, DT);
        assert!(outcome.cancelled);
        assert_eq!(state.velocity.y, 0.0);
    }

    #[test]
    fn test_min_hold_delays_cancel() {
        let config = MovementConfig::default();
        let integrator = MotionIntegrator::new(&config);
        let mut input = input_with(InputConfig::default());
        let mut state = grounded_state();

        // Single-sample tap
        feed(&mut input, jump_frame());
        integrator.integrate(&mut state, &mut input, DT);

        feed(&mut input, InputFrame::new());
        let outcome = integrator.integrate(&mut state, &mut input, DT);
        assert!(!outcome.cancelled, "min-hold keeps the tap held");
        assert!(state.velocity.y > 0.0);
    }

    #[test]
    fn test_release_after_window_keeps_velocity() {
        let config = MovementConfig {
            jump_response_time: 0.0,
            jump_allow_cancel_time: 0.05,
            ..MovementConfig::default()
        };
        let integrator = MotionIntegrator::new(&config);
        let mut input = input_with(InputConfig {
            jump_min_hold: 0.0,
            ..InputConfig::default()
        });
        let mut state = grounded_state();

        feed(&mut input, jump_frame());
        integrator.integrate(&mut state, &mut input, DT);
        for _ in 0..4 {
            feed(&mut input, jump_frame());
            integrator.integrate(&mut state, &mut input, DT);
        }

        feed(&mut input, InputFrame::new());
        let outcome = integrator.integrate(&mut state, &mut input, DT);
        assert!(!outcome.cancelled);
        assert!(state.velocity.y > 0.0);
    }

    #[test]
    fn test_half_gravity_near_apex() {
        let config = MovementConfig::default();
        let integrator = MotionIntegrator::new(&config);
        let mut input = input_with(InputConfig::default());

        let mut apex = MotionState::default();
        apex.velocity.y = 1.0;
        integrator.integrate(&mut apex, &mut input, DT);
        assert!((apex.velocity.y - (1.0 - config.gravity * 0.5 * DT)).abs() < 1e-5);

        let mut fast = MotionState::default();
        fast.velocity.y = 8.0;
        integrator.integrate(&mut fast, &mut input, DT);
        assert!((fast.velocity.y - (8.0 - config.gravity * DT)).abs() < 1e-5);
    }

    #[test]
    fn test_fall_speed_clamped() {
        let config = MovementConfig::default();
        let integrator = MotionIntegrator::new(&config);
        let mut input = input_with(InputConfig::default());
        let mut state = MotionState::default();

        for _ in 0..120 {
            integrator.integrate(&mut state, &mut input, DT);
        }
        assert_eq!(state.velocity.y, -config.max_fall);
    }

    #[test]
    fn test_run_accel_and_reduce() {
        let config = MovementConfig::default();
        let integrator = MotionIntegrator::new(&config);
        let mut input = input_with(InputConfig::default());

        let mut ground = grounded_state();
        let mut air = MotionState::default();
        feed(&mut input, InputFrame::with_axis(1.0, 0.0));
        integrator.integrate(&mut ground, &mut input, DT);
        integrator.integrate(&mut air, &mut input, DT);
        assert!((ground.velocity.x - config.run_accel * DT).abs() < 1e-5);
        assert!((air.velocity.x - config.run_accel * config.air_mult * DT).abs() < 1e-5);

        for _ in 0..60 {
            ground.grounded = true;
            integrator.integrate(&mut ground, &mut input, DT);
        }
        assert_eq!(ground.velocity.x, config.max_run);

        feed(&mut input, InputFrame::new());
        ground.grounded = true;
        integrator.integrate(&mut ground, &mut input, DT);
        assert!((ground.velocity.x - (config.max_run - config.run_reduce * DT)).abs() < 1e-5);
        assert_eq!(ground.facing, Facing::Right);
    }

    #[test]
    fn test_forced_direction_during_level_enter() {
        let config = MovementConfig::default();
        let integrator = MotionIntegrator::new(&config);
        let mut input = input_with(InputConfig::default());
        let mut state = MotionState {
            grounded: true,
            level_enter_timer: 0.1,
            forced_direction: -1.0,
            ..MotionState::default()
        };

        feed(&mut input, InputFrame::with_axis(1.0, 0.0));
        integrator.integrate(&mut state, &mut input, DT);
        assert!(state.velocity.x < 0.0);
        assert_eq!(state.facing, Facing::Left);

        let mut previous = state.velocity.x;
        for tick in 0..20 {
            integrator.integrate(&mut state, &mut input, DT);
            if state.level_enter_timer == 0.0 {
                let rising = state.velocity.x > previous || state.velocity.x == config.max_run;
                assert!(rising, "player input resumes at tick {tick}");
            }
            previous = state.velocity.x;
        }
        assert_eq!(state.level_enter_timer, 0.0);
        assert!(state.velocity.x > 0.0);
        assert_eq!(state.facing, Facing::Right);
    }
}
