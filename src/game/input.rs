//! Input Buffering
//!
//! Decouples variable-rate input polling from the fixed simulation tick.
//!
//! Raw key state is sampled once per rendered frame with
//! [`InputService::sample`]. Once per fixed tick
//! [`InputService::fixed_update`] consolidates everything seen since the
//! previous tick into debounced per-button state, so a press shorter than a
//! tick is never lost and a press is never seen twice.
//!
//! On top of the debounced state each [`Button`] keeps two windows:
//!
//! - **pre-input**: a press is remembered for a short time, so a jump pressed
//!   just before landing still fires on the first grounded tick.
//! - **min-hold**: after a consumer accepts a press ([`Button::on_trigger`]),
//!   the button keeps reading as held for a minimum duration.

use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher};
use crate::core::vec2::Vec2;
use crate::game::config::InputConfig;

// =============================================================================
// BUTTON IDS
// =============================================================================

/// Logical buttons known to the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ButtonId {
    /// Jump
    Jump = 0,
    /// Digital left
    Left = 1,
    /// Digital right
    Right = 2,
    /// Digital up
    Up = 3,
    /// Digital down
    Down = 4,
}

impl ButtonId {
    /// Number of buttons.
    pub const COUNT: usize = 5;

    /// All buttons in index order.
    pub const ALL: [ButtonId; Self::COUNT] = [
        ButtonId::Jump,
        ButtonId::Left,
        ButtonId::Right,
        ButtonId::Up,
        ButtonId::Down,
    ];

    /// Bit in [`InputFrame::flags`].
    #[inline]
    pub const fn flag(self) -> u8 {
        1 << (self as u8)
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

// =============================================================================
// RAW INPUT FRAME
// =============================================================================

/// Raw input sampled from the device for one rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Analog stick, components in [-1, 1]. Zero means "use the digital buttons".
    pub axis: Vec2,

    /// Buttons currently down, one bit per [`ButtonId`].
    pub flags: u8,
}

impl InputFrame {
    /// Create an empty frame (nothing pressed).
    pub const fn new() -> Self {
        Self {
            axis: Vec2::ZERO,
            flags: 0,
        }
    }

    /// Frame with only an analog axis.
    pub fn with_axis(x: f32, y: f32) -> Self {
        Self {
            axis: Vec2::new(x, y),
            flags: 0,
        }
    }

    /// Frame with the given buttons down.
    pub fn with_buttons(buttons: &[ButtonId]) -> Self {
        let mut frame = Self::new();
        for button in buttons {
            frame.set(*button, true);
        }
        frame
    }

    /// Is this button down?
    #[inline]
    pub fn is_down(&self, button: ButtonId) -> bool {
        self.flags & button.flag() != 0
    }

    /// Set or clear a button.
    #[inline]
    pub fn set(&mut self, button: ButtonId, down: bool) {
        if down {
            self.flags |= button.flag();
        } else {
            self.flags &= !button.flag();
        }
    }

    /// Builder form of [`InputFrame::set`].
    #[inline]
    pub fn pressing(mut self, button: ButtonId) -> Self {
        self.set(button, true);
        self
    }

    /// No axis and no buttons.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags == 0 && self.axis == Vec2::ZERO
    }
}

// =============================================================================
// BUTTON
// =============================================================================

/// Debounced state machine for one logical button.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Button {
    id: ButtonId,
    pre_input_window: f32,
    min_hold_window: f32,

    /// Ticks since the buffered press, `None` when nothing is buffered
    press_age: Option<u32>,
    /// Pre-input window in whole ticks at the last tick length
    pre_input_ticks: u32,
    min_hold_timer: f32,

    /// OR of every raw sample since the last fixed tick
    pending: bool,
    /// Latest raw sample
    raw_down: bool,
    /// Latest raw sample was a down edge
    raw_pressed: bool,

    held_this_tick: bool,
    pressed_this_tick: bool,
}

impl Button {
    /// Create a button with its buffering windows (negative values clamp to 0).
    pub fn new(id: ButtonId, pre_input_window: f32, min_hold_window: f32) -> Self {
        Self {
            id,
            pre_input_window: pre_input_window.max(0.0),
            min_hold_window: min_hold_window.max(0.0),
            press_age: None,
            pre_input_ticks: 0,
            min_hold_timer: 0.0,
            pending: false,
            raw_down: false,
            raw_pressed: false,
            held_this_tick: false,
            pressed_this_tick: false,
        }
    }

    /// Button identity.
    #[inline]
    pub fn id(&self) -> ButtonId {
        self.id
    }

    /// Variable-rate sampling step: record the raw key level.
    pub fn sample(&mut self, down: bool) {
        self.raw_pressed = down && !self.raw_down;
        self.raw_down = down;
        self.pending |= down;
    }

    /// Fixed-rate consolidation. Call exactly once per simulation tick.
    pub fn fixed_update(&mut self, dt: f32) {
        let held = self.pending || self.raw_down;
        self.pending = false;

        self.pressed_this_tick = held && !self.held_this_tick;
        self.held_this_tick = held;

        self.pre_input_ticks = window_ticks(self.pre_input_window, dt);
        self.press_age = if !held {
            None
        } else if self.pressed_this_tick {
            Some(0)
        } else {
            self.press_age.map(|age| age.saturating_add(1))
        };

        self.min_hold_timer = (self.min_hold_timer - dt).max(0.0);
    }

    /// Was the button pressed?
    ///
    /// With `fixed_check` this is the buffered answer: a press edge this tick
    /// or a press still inside the pre-input window. Without it, the raw edge
    /// of the latest frame sample.
    ///
    /// The window is counted in whole ticks and is inclusive: with a 0.1 s
    /// window at 60 Hz a press made on tick `t` still reads as pressed on
    /// tick `t + 6`.
    #[inline]
    pub fn pressed(&self, fixed_check: bool) -> bool {
        if fixed_check {
            self.pressed_this_tick || self.buffered()
        } else {
            self.raw_pressed
        }
    }

    /// Is the button held?
    ///
    /// With `fixed_check`: held this tick or inside the min-hold window.
    /// Without it, the raw level of the latest frame sample.
    #[inline]
    pub fn checked(&self, fixed_check: bool) -> bool {
        if fixed_check {
            self.held_this_tick || self.min_hold_timer > 0.0
        } else {
            self.raw_down
        }
    }

    /// Buffered [`Button::pressed`].
    #[inline]
    pub fn pressed_fixed(&self) -> bool {
        self.pressed(true)
    }

    /// Buffered [`Button::checked`].
    #[inline]
    pub fn checked_fixed(&self) -> bool {
        self.checked(true)
    }

    /// A consumer accepted the buffered press.
    ///
    /// Starts the min-hold window and empties the pre-input window so the
    /// same press cannot trigger twice.
    pub fn on_trigger(&mut self) {
        self.min_hold_timer = self.min_hold_window;
        self.press_age = None;
    }

    /// Consolidated level for the current tick, ignoring min-hold.
    #[inline]
    pub fn held_this_tick(&self) -> bool {
        self.held_this_tick
    }

    /// An unconsumed press is still inside the pre-input window.
    #[inline]
    pub fn buffered(&self) -> bool {
        self.press_age.is_some_and(|age| age <= self.pre_input_ticks)
    }

    /// Remaining min-hold time.
    #[inline]
    pub fn min_hold_timer(&self) -> f32 {
        self.min_hold_timer
    }

    /// Forget all state (level reload).
    pub fn reset(&mut self) {
        *self = Self::new(self.id, self.pre_input_window, self.min_hold_window);
    }
}

/// A window in seconds as a whole number of ticks of length `dt`.
fn window_ticks(window: f32, dt: f32) -> u32 {
    if dt > 0.0 && window.is_finite() {
        (window / dt).round() as u32
    } else {
        0
    }
}

// =============================================================================
// JOYSTICK
// =============================================================================

/// Analog stick with digital fallback.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Joystick {
    axis: Vec2,
}

impl Joystick {
    /// Record the analog axis from a frame sample.
    pub fn sample(&mut self, axis: Vec2) {
        self.axis = if axis.is_finite() {
            axis.clamp_components(1.0)
        } else {
            Vec2::ZERO
        };
    }

    /// Latest analog axis.
    #[inline]
    pub fn raw_axis(&self) -> Vec2 {
        self.axis
    }

    /// Axis value, falling back to the four digital buttons when the analog
    /// axis is zero.
    pub fn value(&self, left: &Button, right: &Button, up: &Button, down: &Button) -> Vec2 {
        if self.axis != Vec2::ZERO {
            return self.axis;
        }
        let digital = |neg: &Button, pos: &Button| {
            (pos.checked_fixed() as i8 - neg.checked_fixed() as i8) as f32
        };
        Vec2::new(digital(left, right), digital(down, up))
    }
}

// =============================================================================
// INPUT SERVICE
// =============================================================================

/// All input state for one controlled actor.
///
/// Constructed once and passed by reference to whatever consumes input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputService {
    buttons: [Button; ButtonId::COUNT],
    joystick: Joystick,
}

impl InputService {
    /// Create with the windows from config.
    pub fn new(config: &InputConfig) -> Self {
        let buttons = ButtonId::ALL.map(|id| match id {
            ButtonId::Jump => Button::new(id, config.jump_pre_input, config.jump_min_hold),
            _ => Button::new(id, config.default_pre_input, config.default_min_hold),
        });
        Self {
            buttons,
            joystick: Joystick::default(),
        }
    }

    /// Variable-rate step: copy one frame of raw input into pending state.
    pub fn sample(&mut self, frame: &InputFrame) {
        for button in &mut self.buttons {
            button.sample(frame.is_down(button.id()));
        }
        self.joystick.sample(frame.axis);
    }

    /// Fixed-rate step: consolidate every button.
    pub fn fixed_update(&mut self, dt: f32) {
        for button in &mut self.buttons {
            button.fixed_update(dt);
        }
    }

    /// Access a button.
    #[inline]
    pub fn button(&self, id: ButtonId) -> &Button {
        &self.buttons[id.index()]
    }

    /// Mutable access, used to call [`Button::on_trigger`].
    #[inline]
    pub fn button_mut(&mut self, id: ButtonId) -> &mut Button {
        &mut self.buttons[id.index()]
    }

    /// Movement direction with digital fallback.
    pub fn axis(&self) -> Vec2 {
        self.joystick.value(
            self.button(ButtonId::Left),
            self.button(ButtonId::Right),
            self.button(ButtonId::Up),
            self.button(ButtonId::Down),
        )
    }

    /// The input the current tick actually consumed, as a single frame.
    ///
    /// Feeding this frame once before a tick reproduces the same debounced
    /// state, however many frames were sampled in between. Recordings store
    /// this rather than raw frames.
    pub fn tick_frame(&self) -> InputFrame {
        let mut frame = InputFrame::new();
        frame.axis = self.joystick.raw_axis();
        for button in &self.buttons {
            frame.set(button.id(), button.held_this_tick());
        }
        frame
    }

    /// Forget all state (level reload / respawn).
    pub fn reset(&mut self) {
        for button in &mut self.buttons {
            button.reset();
        }
        self.joystick = Joystick::default();
    }
}

// =============================================================================
// RECORDING
// =============================================================================

/// Recording errors.
#[derive(Debug, thiserror::Error)]
pub enum RecordingError {
    /// Encoding or decoding failed.
    #[error("Recording codec error: {0}")]
    Codec(#[from] bincode::Error),
}

/// An input frame that started at `tick`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u64,
    /// The new input state
    pub frame: InputFrame,
}

/// Delta-compressed per-tick input for one actor.
///
/// Only ticks where the frame changed are stored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputRecording {
    /// Actor the recording drove
    pub actor_id: u32,
    /// Last recorded tick
    pub end_tick: u64,
    deltas: Vec<InputDelta>,
    #[serde(skip)]
    last_frame: InputFrame,
}

impl InputRecording {
    /// Create an empty recording.
    pub fn new(actor_id: u32) -> Self {
        Self {
            actor_id,
            end_tick: 0,
            deltas: Vec::with_capacity(256),
            last_frame: InputFrame::new(),
        }
    }

    /// Record the frame used for `tick`. Only stored if it changed.
    pub fn record(&mut self, tick: u64, frame: InputFrame) {
        self.end_tick = tick;
        if frame != self.last_frame {
            self.deltas.push(InputDelta { tick, frame });
            self.last_frame = frame;
        }
    }

    /// Frame in effect at `tick` (idle before the first change).
    pub fn frame_at(&self, tick: u64) -> InputFrame {
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        if idx == 0 {
            InputFrame::new()
        } else {
            self.deltas[idx - 1].frame
        }
    }

    /// Stored deltas.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Iterate `(tick, frame)` from tick 1 to `end_tick`.
    pub fn replay_iter(&self) -> impl Iterator<Item = (u64, InputFrame)> + '_ {
        (1..=self.end_tick).map(move |tick| (tick, self.frame_at(tick)))
    }

    /// Hash of the recorded inputs.
    pub fn hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_recording();
        hasher.update_u32(self.actor_id);
        hasher.update_u64(self.end_tick);
        for delta in &self.deltas {
            hasher.update_u64(delta.tick);
            hasher.update_vec2(delta.frame.axis);
            hasher.update_u8(delta.frame.flags);
        }
        hasher.finalize()
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordingError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordingError> {
        let mut recording: InputRecording = bincode::deserialize(bytes)?;
        recording.last_frame = recording
            .deltas
            .last()
            .map(|d| d.frame)
            .unwrap_or_default();
        Ok(recording)
    }
}

// =============================================================================
// TESTS
// =============================================================================
