//! Input Samples and Recording
//!
//! Raw pointer samples and keyboard fallback commands as they arrive from
//! the host, plus a sparse per-tick log used to replay a run.

use serde::{Serialize, Deserialize};
use crate::core::vec3::Vec2;

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Identifier of a touch/pointer as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PointerId(pub u32);

/// Pointer lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerPhase {
    /// Finger down / button pressed
    Begin,
    /// Position update while down
    Move,
    /// Finger up / button released
    End,
    /// Host cancelled the pointer (e.g. system gesture)
    Cancel,
}

/// One raw pointer sample.
///
/// Positions are in pixels with Y pointing up.
/// `time` is on the real (unscaled) clock, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    /// Which pointer produced this sample
    pub pointer_id: PointerId,
    /// Lifecycle phase
    pub phase: PointerPhase,
    /// Screen position
    pub position: Vec2,
    /// Real-clock timestamp
    pub time: f32,
    /// Is this point over a UI element that swallows gestures?
    pub over_blocking_ui: bool,
}

impl PointerSample {
    /// Create a sample that is not over blocking UI.
    pub const fn new(pointer_id: PointerId, phase: PointerPhase, position: Vec2, time: f32) -> Self {
        Self {
            pointer_id,
            phase,
            position,
            time,
            over_blocking_ui: false,
        }
    }

    /// Mark the sample as being over blocking UI.
    pub const fn over_ui(mut self) -> Self {
        self.over_blocking_ui = true;
        self
    }
}

/// Keyboard / mouse fallback command.
///
/// Delivered to the same classifier as gestures, with the same gating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyCommand {
    /// Move one lane left
    Left,
    /// Move one lane right
    Right,
    /// Request a jump
    Jump,
}

/// Host-side command (HUD buttons, external collision layer).
///
/// Applied at the start of the tick, before gesture classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostCommand {
    /// Begin the run when the session was created without auto-start
    Start,
    /// Pause or resume
    SetPaused(bool),
    /// Flip the pause flag
    TogglePause,
    /// Retry: start a fresh run
    Reset,
    /// Zero the persisted best score
    ClearBest,
    /// External hazard contact
    HazardContact,
}

/// Everything the host delivered during one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Pointer samples, in arrival order
    pub pointers: Vec<PointerSample>,
    /// Keyboard commands, with their real-clock timestamps
    pub keys: Vec<(KeyCommand, f32)>,
    /// Host commands, in arrival order
    #[serde(default)]
    pub commands: Vec<HostCommand>,
}

impl TickInput {
    /// An input with nothing in it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Input holding a single pointer sample.
    pub fn pointer(sample: PointerSample) -> Self {
        Self {
            pointers: vec![sample],
            ..Self::default()
        }
    }

    /// Input holding a single key command.
    pub fn key(command: KeyCommand, time: f32) -> Self {
        Self {
            keys: vec![(command, time)],
            ..Self::default()
        }
    }

    /// Input holding a single host command.
    pub fn command(command: HostCommand) -> Self {
        Self {
            commands: vec![command],
            ..Self::default()
        }
    }

    /// Check if nothing happened this tick.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.pointers.is_empty() && self.keys.is_empty() && self.commands.is_empty()
    }
}

// =============================================================================
// INPUT LOG
// =============================================================================

/// Input recorded at one tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoggedInput {
    /// Tick the input was delivered on
    pub tick: u64,
    /// The input itself
    pub input: TickInput,
}

/// Sparse recording of a run's input.
///
/// Only ticks with input are stored. Used to replay a session and check
/// that it reproduces the same state hash.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputLog {
    /// Seed the run was started with
    pub seed: u64,

    /// Last tick covered by the log
    pub end_tick: u64,

    /// Non-idle inputs, sorted by tick
    entries: Vec<LoggedInput>,
}

impl InputLog {
    /// Create an empty log.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            end_tick: 0,
            entries: Vec::with_capacity(256),
        }
    }

    /// Record input for a tick.
    ///
    /// Idle ticks only extend `end_tick`. Ticks must be recorded in order.
    pub fn record(&mut self, tick: u64, input: &TickInput) {
        self.end_tick = self.end_tick.max(tick);

        if input.is_idle() {
            return;
        }

        debug_assert!(
            self.entries.last().is_none_or(|e| e.tick < tick),
            "input log ticks must be strictly increasing"
        );
        self.entries.push(LoggedInput {
            tick,
            input: input.clone(),
        });
    }

    /// Get the input delivered at a specific tick.
    ///
    /// Uses binary search; returns None for idle ticks.
    pub fn input_at(&self, tick: u64) -> Option<&TickInput> {
        self.entries
            .binary_search_by_key(&tick, |e| e.tick)
            .ok()
            .map(|idx| &self.entries[idx].input)
    }

    /// All recorded entries.
    pub fn entries(&self) -> &[LoggedInput] {
        &self.entries
    }

    /// Number of non-idle ticks recorded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no input was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finalize the log (call when the run ends).
    pub fn finalize(&mut self, end_tick: u64) {
        self.end_tick = end_tick;
    }

    /// Serialize to compact binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }

    /// Iterate every tick from 1 through `end_tick`, idle ticks included.
    pub fn replay_iter(&self) -> ReplayIterator<'_> {
        ReplayIterator {
            log: self,
            current_tick: 1,
            entry_idx: 0,
            idle: TickInput::empty(),
        }
    }
}

/// Iterator for replaying inputs tick-by-tick.
pub struct ReplayIterator<'a> {
    log: &'a InputLog,
    current_tick: u64,
    entry_idx: usize,
    idle: TickInput,
}

impl<'a> Iterator for ReplayIterator<'a> {
    type Item = (u64, TickInput);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_tick > self.log.end_tick {
            return None;
        }

        let tick = self.current_tick;
        self.current_tick += 1;

        match self.log.entries.get(self.entry_idx) {
            Some(entry) if entry.tick == tick => {
                self.entry_idx += 1;
                Some((tick, entry.input.clone()))
            }
            _ => Some((tick, self.idle.clone())),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
