//! Simulation Tick
//!
//! One entry point advances every component in a fixed order:
//!
//! ```text
//!  TickInput
//!     |
//!     v
//!  0. host commands (start, pause, reset, hazard) -> Session
//!  1. clock advance (scale from Session)
//!  2. Gesture: samples + keys -> commands        (real clock, pause-gated)
//!  3. Motion: commands + speed -> one move       (sim clock)
//!  4. World: forward z -> spawn / despawn        -> mover.on_tiles_changed
//!  5. Session: counters, hazard -> game over
//!     |
//!     v
//!  TickResult { events, motion, ... }
//! ```
//!
//! Session output (speed, pause, state) feeds the next tick's steps.

use tracing::debug;
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::core::clock::TickClock;
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::derive_run_seed;
use crate::core::vec3::Vec3;
use crate::game::collision::CharacterMover;
use crate::game::config::RunnerConfig;
use crate::game::events::{sort_events, SimEvent, SimEventData};
use crate::game::gesture::{GestureClassifier, GestureCommand};
use crate::game::input::{HostCommand, InputLog, TickInput};
use crate::game::motion::{MotionController, MotionInput, MotionOutput};
use crate::game::session::{GameOverSummary, SessionStateMachine};
use crate::game::store::BestScoreStore;
use crate::game::world::WorldStreamer;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick (and by calls made since the last tick)
    pub events: Vec<SimEvent>,
    /// Commands the classifier fired this tick
    pub commands: Vec<GestureCommand>,
    /// Read-only motion output for presentation
    pub motion: MotionOutput,
    /// Set on the tick the run ended
    pub game_over: Option<GameOverSummary>,
}

/// The runner simulation.
///
/// Owns all four components, the clock, the collision mover and the
/// best-score store. Nothing is reached through globals.
pub struct Simulation<M: CharacterMover, S: BestScoreStore> {
    config: RunnerConfig,
    clock: TickClock,
    gesture: GestureClassifier,
    motion: MotionController,
    world: WorldStreamer,
    session: SessionStateMachine,
    mover: M,
    store: S,
    start_position: Vec3,
    run_index: u32,
    recording: InputLog,
    pending_game_over: Option<GameOverSummary>,
}

impl<M: CharacterMover, S: BestScoreStore> Simulation<M, S> {
    /// Create a simulation. The body's current position is the run start.
    pub fn new(config: RunnerConfig, mut mover: M, store: S) -> Self {
        config.report_issues();

        let start_position = mover.position();
        let persisted_best = store.get(&config.session.best_score_key);

        let world = WorldStreamer::new(config.world.clone(), derive_run_seed(config.seed, 0));
        mover.on_tiles_changed(&world);

        debug!(seed = config.seed, best = persisted_best, "Simulation created");

        Self {
            clock: TickClock::new(),
            gesture: GestureClassifier::new(config.gesture.clone()),
            motion: MotionController::new(config.motion.clone()),
            session: SessionStateMachine::new(config.session.clone(), persisted_best, start_position),
            recording: InputLog::new(config.seed),
            world,
            mover,
            store,
            start_position,
            run_index: 0,
            pending_game_over: None,
            config,
        }
    }

    /// Run one simulation tick.
    pub fn tick(&mut self, input: &TickInput) -> TickResult {
        let mut result = TickResult::default();

        // 0. Host commands
        for command in &input.commands {
            self.apply_host_command(*command);
        }

        // 1. Clock
        self.clock.advance(self.config.tick_dt(), self.session.time_scale());
        let tick = self.clock.tick();
        self.recording.record(tick, input);

        // 2. Gesture
        let paused = self.session.is_paused();
        for sample in &input.pointers {
            if let Some(command) = self.gesture.handle_sample(sample, paused) {
                result.commands.push(command);
            }
        }
        for &(key, time) in &input.keys {
            if let Some(command) = self.gesture.handle_key(key, time, paused) {
                result.commands.push(command);
            }
        }

        // 3. Motion
        let sim_dt = self.clock.sim_dt();
        let motion_input = MotionInput {
            commands: &result.commands,
            forward_speed: self.session.current_speed(),
            running: self.session.is_advancing(),
        };
        let output = self.motion.tick(&motion_input, self.clock.sim_time(), sim_dt, &mut self.mover);

        // 4. World
        self.world.update(output.position.z);
        let world_events = self.world.take_events();
        if !world_events.is_empty() {
            self.mover.on_tiles_changed(&self.world);
        }

        // 5. Session
        self.session.tick(sim_dt, output.position);
        if output.hazard_contact {
            if let Some(summary) = self.end_run() {
                self.pending_game_over = Some(summary);
            }
        }

        #[cfg(feature = "debug-tracing")]
        trace!(
            tick,
            z = output.position.z,
            lane = self.motion.lane().index,
            grounded = output.grounded,
            speed = self.session.current_speed(),
            "tick"
        );

        // Collect events
        let mut events: Vec<SimEvent> = result
            .commands
            .iter()
            .map(|&command| SimEvent::new(tick, SimEventData::GestureFired { command }))
            .collect();
        events.extend(SimEvent::stamp_all(tick, self.motion.take_events()));
        events.extend(SimEvent::stamp_all(tick, world_events));
        events.extend(SimEvent::stamp_all(tick, self.session.take_events()));
        sort_events(&mut events);

        result.events = events;
        result.motion = output;
        result.game_over = self.pending_game_over.take();
        result
    }

    fn apply_host_command(&mut self, command: HostCommand) {
        match command {
            HostCommand::Start => {
                self.start();
            }
            HostCommand::SetPaused(paused) => {
                self.set_paused(paused);
            }
            HostCommand::TogglePause => {
                self.toggle_pause();
            }
            HostCommand::Reset => self.reset(),
            HostCommand::ClearBest => self.clear_best(),
            HostCommand::HazardContact => {
                if let Some(summary) = self.end_run() {
                    self.pending_game_over = Some(summary);
                }
            }
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Move a Ready session to Running. Returns whether the run started.
    pub fn start(&mut self) -> bool {
        match self.session.start() {
            Ok(()) => true,
            Err(err) => {
                debug!("Start request ignored: {}", err);
                false
            }
        }
    }

    /// Pause or resume. Returns whether the flag changed.
    ///
    /// The classifier sees the change before this returns.
    pub fn set_paused(&mut self, paused: bool) -> bool {
        match self.session.set_paused(paused) {
            Ok(changed) => {
                if changed {
                    self.gesture.on_pause_changed(paused);
                }
                changed
            }
            Err(err) => {
                debug!("Pause request ignored: {}", err);
                false
            }
        }
    }

    /// Flip the pause flag. Returns whether it changed.
    pub fn toggle_pause(&mut self) -> bool {
        let paused = !self.session.is_paused();
        self.set_paused(paused)
    }

    /// Hazard contact reported by the host between ticks.
    ///
    /// Ends the run synchronously and returns the summary; repeated contacts
    /// are no-ops. The summary is delivered here only, not again in the next
    /// [`TickResult::game_over`].
    pub fn report_hazard_contact(&mut self) -> Option<GameOverSummary> {
        self.end_run()
    }

    fn end_run(&mut self) -> Option<GameOverSummary> {
        match self.session.game_over(&mut self.store) {
            Ok(summary) => {
                self.gesture.on_pause_changed(true);
                Some(summary)
            }
            Err(err) => {
                debug!("Hazard contact ignored: {}", err);
                None
            }
        }
    }

    /// Start a fresh run.
    ///
    /// Gesture, motion and world state are rebuilt; the body goes back to
    /// the start. Only the persisted best survives.
    pub fn reset(&mut self) {
        self.run_index += 1;

        self.gesture = GestureClassifier::new(self.config.gesture.clone());
        self.motion = MotionController::new(self.config.motion.clone());
        self.world = WorldStreamer::new(
            self.config.world.clone(),
            derive_run_seed(self.config.seed, self.run_index),
        );

        self.mover.place(self.start_position);
        self.mover.on_tiles_changed(&self.world);
        self.session.reset(self.start_position);
        self.pending_game_over = None;
    }

    /// Zero the persisted best score.
    pub fn clear_best(&mut self) {
        self.session.clear_best(&mut self.store);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Configuration in use.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Current tick number.
    pub fn current_tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Both clocks.
    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// Session state.
    pub fn session(&self) -> &SessionStateMachine {
        &self.session
    }

    /// Motion state.
    pub fn motion(&self) -> &MotionController {
        &self.motion
    }

    /// World streamer.
    pub fn world(&self) -> &WorldStreamer {
        &self.world
    }

    /// Gesture classifier.
    pub fn gesture(&self) -> &GestureClassifier {
        &self.gesture
    }

    /// Collision mover.
    pub fn mover(&self) -> &M {
        &self.mover
    }

    /// Best-score store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Inputs recorded so far.
    pub fn input_log(&self) -> &InputLog {
        &self.recording
    }

    /// Take the recorded input log, finalized at the current tick.
    pub fn take_input_log(&mut self) -> InputLog {
        let mut log = std::mem::replace(&mut self.recording, InputLog::new(self.config.seed));
        log.finalize(self.clock.tick());
        log
    }

    /// Hash the simulation state for replay verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.clock.tick(), self.config.seed, |hasher| {
            hasher.update_f32(self.clock.real_time());
            hasher.update_f32(self.clock.sim_time());
            hasher.update_u32(self.run_index);

            self.session.hash_into(hasher);

            let lane = self.motion.lane();
            hasher.update_u8(lane.index);
            hasher.update_f32(lane.current_lateral);
            let vertical = self.motion.vertical();
            hasher.update_f32(vertical.velocity);
            hasher.update_bool(vertical.grounded);
            hasher.update_f32(vertical.air_time);
            hasher.update_vec3(self.mover.position());

            hasher.update_f32(self.world.next_spawn_z());
            for word in self.world.rng_state() {
                hasher.update_u64(word);
            }
            hasher.update_u32(self.world.active_len() as u32);
            for (handle, tile) in self.world.active_window() {
                hasher.update_u32(handle.0);
                hasher.update_u32(tile.kind as u32);
                hasher.update_f32(tile.z);
            }
        })
    }
}

/// Replay a recorded run against a fresh simulation.
///
/// The log's seed overrides the config seed.
pub fn replay_run<M, S>(config: &RunnerConfig, log: &InputLog, mover: M, store: S) -> Simulation<M, S>
where
    M: CharacterMover,
    S: BestScoreStore,
{
    let mut config = config.clone();
    config.seed = log.seed;

    let mut sim = Simulation::new(config, mover, store);
    for (_, input) in log.replay_iter() {
        sim.tick(&input);
    }
    sim
}
