//! Simulation Events
//!
//! Events generated during a tick, drained once per tick for presentation,
//! logging and replay comparison.

use serde::{Serialize, Deserialize};
use crate::game::gesture::{GestureCommand, LaneDirection};
use crate::game::world::TileHandle;

/// Component that emitted an event.
///
/// Matches the per-tick step order, so sorting by source reproduces the
/// order the steps ran in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventSource {
    /// Gesture classification runs first
    Gesture = 0,
    /// Then motion
    Motion = 1,
    /// Then world streaming
    World = 2,
    /// Session last
    Session = 3,
}

/// Simulation event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEventData {
    /// A gesture or fallback key produced a command
    GestureFired {
        command: GestureCommand,
    },

    /// Lane index changed
    LaneChanged {
        direction: LaneDirection,
        from_lane: u8,
        to_lane: u8,
    },

    /// Jump request buffered
    JumpRequested,

    /// Jump launched
    JumpExecuted {
        launch_velocity: f32,
        /// Launched from coyote time rather than the ground
        coyote: bool,
    },

    /// Buffered request timed out without a jump
    JumpExpired,

    /// Body touched down
    Landed {
        air_time: f32,
    },

    /// Tile placed at the tail of the active window
    TileSpawned {
        handle: TileHandle,
        kind: usize,
        z: f32,
    },

    /// Tile removed from the head and parked
    TileDespawned {
        handle: TileHandle,
        z: f32,
    },

    /// Pause flag changed
    PauseChanged {
        paused: bool,
    },

    /// Live score changed
    ScoreChanged {
        score: f32,
    },

    /// Displayed best changed
    BestChanged {
        best: f32,
    },

    /// Run entered Running
    RunStarted,

    /// Run ended
    GameOver {
        final_score: f32,
        final_best: f32,
    },

    /// Run was reset for a retry
    RunReset,
}

impl SimEventData {
    /// Component that emits this kind of event.
    pub fn source(&self) -> EventSource {
        match self {
            SimEventData::GestureFired { .. } => EventSource::Gesture,
            SimEventData::LaneChanged { .. }
            | SimEventData::JumpRequested
            | SimEventData::JumpExecuted { .. }
            | SimEventData::JumpExpired
            | SimEventData::Landed { .. } => EventSource::Motion,
            SimEventData::TileSpawned { .. } | SimEventData::TileDespawned { .. } => EventSource::World,
            SimEventData::PauseChanged { .. }
            | SimEventData::ScoreChanged { .. }
            | SimEventData::BestChanged { .. }
            | SimEventData::RunStarted
            | SimEventData::GameOver { .. }
            | SimEventData::RunReset => EventSource::Session,
        }
    }

    /// Events the presentation layer cares about.
    pub fn is_presentation(&self) -> bool {
        matches!(
            self,
            SimEventData::PauseChanged { .. }
                | SimEventData::ScoreChanged { .. }
                | SimEventData::BestChanged { .. }
                | SimEventData::GameOver { .. }
                | SimEventData::RunReset
        )
    }
}

/// An event stamped with the tick it happened on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    /// Tick when the event occurred
    pub tick: u64,

    /// Emitting component
    pub source: EventSource,

    /// Event data
    pub data: SimEventData,
}

impl SimEvent {
    /// Create a new event.
    pub fn new(tick: u64, data: SimEventData) -> Self {
        Self {
            tick,
            source: data.source(),
            data,
        }
    }

    /// Create a pause changed event.
    pub fn pause_changed(tick: u64, paused: bool) -> Self {
        Self::new(tick, SimEventData::PauseChanged { paused })
    }

    /// Create a game over event.
    pub fn game_over(tick: u64, final_score: f32, final_best: f32) -> Self {
        Self::new(tick, SimEventData::GameOver { final_score, final_best })
    }

    /// Stamp a batch of component events with a tick.
    pub fn stamp_all(tick: u64, data: Vec<SimEventData>) -> impl Iterator<Item = SimEvent> {
        data.into_iter().map(move |d| SimEvent::new(tick, d))
    }
}

/// Order a tick's events by tick, then source.
///
/// The sort is stable, so events from one component keep emission order.
pub fn sort_events(events: &mut [SimEvent]) {
    events.sort_by(|a, b| a.tick.cmp(&b.tick).then(a.source.cmp(&b.source)));
}
