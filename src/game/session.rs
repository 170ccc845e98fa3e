//! Session State Machine
//!
//! Run state, speed ramp, score, best score and pause.
//!
//! ## Transitions
//!
//! ```text
//!            start                 game_over
//!   Ready ----------> Running ------------------> GameOver
//!     |                 ^  |                         |
//!     |                 |  | set_paused (flag only)  |
//!     |                 +--+                         |
//!     |      reset                                   |
//!     +-------------> Running <----------------------+
//! ```
//!
//! Every transition validates its source state and returns a
//! [`SessionError`] on misuse. Callers treat rejections as no-ops.

use serde::{Serialize, Deserialize};
use tracing::{debug, error, info};

use crate::core::hash::StateHasher;
use crate::core::vec3::Vec3;
use crate::game::events::SimEventData;
use crate::game::store::BestScoreStore;

/// Session tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Speed at the start of a run
    pub base_speed: f32,
    /// Speed gained per second of run time
    pub speed_ramp_per_sec: f32,
    /// Speed cap
    pub max_speed: f32,
    /// Store key of the persisted best
    pub best_score_key: String,
    /// Displayed best follows the live score once it is surpassed
    pub mirror_best_live: bool,
    /// Start running immediately on construction
    pub auto_start: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_speed: 6.0,
            speed_ramp_per_sec: 0.25,
            max_speed: 18.0,
            best_score_key: "BEST_SCORE".to_string(),
            mirror_best_live: true,
            auto_start: true,
        }
    }
}

impl SessionConfig {
    /// Speed after `elapsed` seconds of running.
    #[inline]
    pub fn speed_at(&self, elapsed: f32) -> f32 {
        self.max_speed.min(self.base_speed + self.speed_ramp_per_sec * elapsed)
    }
}

/// Run state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Created, not started
    Ready,
    /// Run in progress (possibly paused)
    Running,
    /// Run ended; only reset leaves this state
    GameOver,
}

impl RunState {
    fn tag(self) -> u8 {
        match self {
            RunState::Ready => 0,
            RunState::Running => 1,
            RunState::GameOver => 2,
        }
    }
}

/// Rejected transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The requested transition is not legal from the current state
    #[error("cannot {action} from {from:?}")]
    InvalidTransition {
        /// State the session was in
        from: RunState,
        /// Transition that was attempted
        action: &'static str,
    },

    /// Pause was requested outside Running
    #[error("pause requires a running session, state is {0:?}")]
    NotRunning(RunState),

    /// Game over was already applied
    #[error("session is already over")]
    AlreadyOver,
}

/// Final values of a finished run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameOverSummary {
    /// Distance run
    pub final_score: f32,
    /// Persisted best after this run
    pub final_best: f32,
    /// This run set a new best
    pub new_best: bool,
}

/// Owns run state, counters and best score.
#[derive(Clone, Debug)]
pub struct SessionStateMachine {
    config: SessionConfig,
    state: RunState,
    paused: bool,
    elapsed_run_time: f32,
    current_speed: f32,
    distance_run: f32,
    start_position: Vec3,
    persisted_best: f32,
    display_best: f32,
    pending_events: Vec<SimEventData>,
}

impl SessionStateMachine {
    /// Create a session.
    ///
    /// `persisted_best` is the value read from the store at startup.
    pub fn new(config: SessionConfig, persisted_best: f32, start_position: Vec3) -> Self {
        let persisted_best = if persisted_best.is_finite() {
            persisted_best.max(0.0)
        } else {
            0.0
        };

        let mut session = Self {
            current_speed: config.base_speed,
            config,
            state: RunState::Ready,
            paused: false,
            elapsed_run_time: 0.0,
            distance_run: 0.0,
            start_position,
            persisted_best,
            display_best: persisted_best,
            pending_events: vec![SimEventData::BestChanged {
                best: persisted_best,
            }],
        };

        if session.config.auto_start {
            // Ready -> Running cannot fail here
            let _ = session.start();
        }
        session
    }

    /// Ready -> Running.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state != RunState::Ready {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                action: "start",
            });
        }

        self.state = RunState::Running;
        self.current_speed = self.config.base_speed;
        self.pending_events.push(SimEventData::RunStarted);
        info!("Run started");
        Ok(())
    }

    /// Set the pause flag.
    ///
    /// Returns whether the flag changed.
    pub fn set_paused(&mut self, paused: bool) -> Result<bool, SessionError> {
        if self.state != RunState::Running {
            return Err(SessionError::NotRunning(self.state));
        }
        if self.paused == paused {
            return Ok(false);
        }

        self.paused = paused;
        self.pending_events.push(SimEventData::PauseChanged { paused });
        debug!(paused, "Pause changed");
        Ok(true)
    }

    /// Advance counters by one tick of simulation time.
    ///
    /// Only counts while running and unpaused.
    pub fn tick(&mut self, sim_dt: f32, position: Vec3) {
        if !self.is_advancing() || sim_dt <= 0.0 {
            return;
        }

        self.elapsed_run_time += sim_dt;
        self.current_speed = self.config.speed_at(self.elapsed_run_time);

        let sampled = self.start_position.planar_distance(position);
        if sampled > self.distance_run {
            self.distance_run = sampled;
            self.pending_events.push(SimEventData::ScoreChanged {
                score: self.distance_run,
            });
        }

        if self.config.mirror_best_live && self.distance_run > self.display_best {
            self.display_best = self.distance_run;
            self.pending_events.push(SimEventData::BestChanged {
                best: self.display_best,
            });
        }
    }

    /// End the run and persist the best score.
    ///
    /// A second call is rejected and changes nothing.
    pub fn game_over<S>(&mut self, store: &mut S) -> Result<GameOverSummary, SessionError>
    where
        S: BestScoreStore + ?Sized,
    {
        if self.state == RunState::GameOver {
            return Err(SessionError::AlreadyOver);
        }

        self.state = RunState::GameOver;
        if !self.paused {
            self.paused = true;
            self.pending_events.push(SimEventData::PauseChanged { paused: true });
        }

        let final_score = self.distance_run;
        let new_best = final_score > self.persisted_best;
        self.persisted_best = self.persisted_best.max(final_score);
        self.display_best = self.display_best.max(self.persisted_best);

        store.set(&self.config.best_score_key, self.persisted_best);
        if let Err(err) = store.flush() {
            error!("Failed to persist best score: {}", err);
        }

        self.pending_events.push(SimEventData::GameOver {
            final_score,
            final_best: self.persisted_best,
        });
        info!(
            score = final_score,
            best = self.persisted_best,
            new_best,
            "Game over"
        );

        Ok(GameOverSummary {
            final_score,
            final_best: self.persisted_best,
            new_best,
        })
    }

    /// Start a fresh run from any state.
    ///
    /// Only the persisted best survives.
    pub fn reset(&mut self, start_position: Vec3) {
        if self.paused {
            self.paused = false;
            self.pending_events.push(SimEventData::PauseChanged { paused: false });
        }

        self.state = RunState::Running;
        self.elapsed_run_time = 0.0;
        self.current_speed = self.config.base_speed;
        self.distance_run = 0.0;
        self.start_position = start_position;
        self.display_best = self.persisted_best;

        self.pending_events.push(SimEventData::RunReset);
        self.pending_events.push(SimEventData::ScoreChanged { score: 0.0 });
        self.pending_events.push(SimEventData::BestChanged {
            best: self.display_best,
        });
        info!(best = self.persisted_best, "Run reset");
    }

    /// Zero the persisted best.
    pub fn clear_best<S>(&mut self, store: &mut S)
    where
        S: BestScoreStore + ?Sized,
    {
        self.persisted_best = 0.0;
        self.display_best = if self.config.mirror_best_live && self.state == RunState::Running {
            self.distance_run
        } else {
            0.0
        };

        store.set(&self.config.best_score_key, 0.0);
        if let Err(err) = store.flush() {
            error!("Failed to clear best score: {}", err);
        }

        self.pending_events.push(SimEventData::BestChanged {
            best: self.display_best,
        });
        info!("Best score cleared");
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Session tuning.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Pause flag.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Running and not paused.
    #[inline]
    pub fn is_advancing(&self) -> bool {
        self.state == RunState::Running && !self.paused
    }

    /// Simulation clock scale for the next tick.
    #[inline]
    pub fn time_scale(&self) -> f32 {
        if self.paused || self.state == RunState::GameOver {
            0.0
        } else {
            1.0
        }
    }

    /// Seconds of unpaused running.
    pub fn elapsed_run_time(&self) -> f32 {
        self.elapsed_run_time
    }

    /// Forward speed.
    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    /// Distance run this session (the score).
    pub fn distance_run(&self) -> f32 {
        self.distance_run
    }

    /// Persisted best.
    pub fn best_score(&self) -> f32 {
        self.persisted_best
    }

    /// Best shown to the player.
    pub fn display_best(&self) -> f32 {
        self.display_best
    }

    /// Where the current run started.
    pub fn start_position(&self) -> Vec3 {
        self.start_position
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<SimEventData> {
        std::mem::take(&mut self.pending_events)
    }

    /// Add session state to a hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.state.tag());
        hasher.update_bool(self.paused);
        hasher.update_f32(self.elapsed_run_time);
        hasher.update_f32(self.current_speed);
        hasher.update_f32(self.distance_run);
        hasher.update_f32(self.persisted_best);
        hasher.update_f32(self.display_best);
    }
}

// =============================================================================
// TESTS
// =============================================================================
