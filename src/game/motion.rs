//! Motion Controller
//!
//! Owns lane position and the vertical jump arc of the controlled body.
//! Each tick composes one displacement from all three axes and applies it
//! through the [`CharacterMover`] exactly once.
//!
//! ## Per-tick order
//!
//! 1. Apply lane / jump commands (jumps are buffered)
//! 2. Execute a buffered jump if grounded or inside coyote time
//! 3. Integrate gravity (asymmetric rise/fall, air-time boost)
//! 4. Ground snap while descending near the floor
//! 5. Smooth lateral position towards the target lane
//! 6. Forward displacement from session speed (zero unless running)
//! 7. Single move, then landing bookkeeping

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::vec3::Vec3;
use crate::game::collision::CharacterMover;
use crate::game::events::SimEventData;
use crate::game::gesture::{GestureCommand, LaneDirection};

/// Number of lanes.
pub const LANE_COUNT: u8 = 3;

/// Lane the body starts in (center).
pub const START_LANE: u8 = 1;

/// Movement and jump tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Lateral distance between adjacent lanes
    pub lane_offset: f32,
    /// Exponential smoothing rate towards the target lane (1/s)
    pub lane_change_speed: f32,
    /// Gravity acceleration (units/s^2)
    pub gravity: f32,
    /// Apex height of a jump under rise gravity
    pub jump_height: f32,
    /// Extra scale on the launch velocity
    pub jump_impulse_multiplier: f32,
    /// Gravity multiplier while moving up
    pub rise_gravity_multiplier: f32,
    /// Gravity multiplier while moving down
    pub fall_gravity_multiplier: f32,
    /// Air time after which gravity is boosted (seconds)
    pub max_air_time: f32,
    /// Gravity boost applied past `max_air_time`
    pub air_time_gravity_boost: f32,
    /// Grace window after leaving the ground (seconds)
    pub coyote_time: f32,
    /// How long a jump request is remembered (seconds)
    pub jump_buffer: f32,
    /// Resting vertical velocity while grounded
    pub grounded_velocity: f32,
    /// Extra reach of the ground-snap probe
    pub snap_distance: f32,
    /// Minimum descent speed once the snap probe hits
    pub min_descent_speed: f32,
    /// Largest corrective downward step from a snap
    pub snap_correction: f32,
    /// Forward speed floor (units/s)
    pub base_forward_speed: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            lane_offset: 1.0,
            lane_change_speed: 10.0,
            gravity: 30.0,
            jump_height: 2.2,
            jump_impulse_multiplier: 1.10,
            rise_gravity_multiplier: 1.0,
            fall_gravity_multiplier: 1.8,
            max_air_time: 1.2,
            air_time_gravity_boost: 2.0,
            coyote_time: 0.1,
            jump_buffer: 0.15,
            grounded_velocity: -1.0,
            snap_distance: 0.2,
            min_descent_speed: 4.0,
            snap_correction: 0.05,
            base_forward_speed: 6.0,
        }
    }
}

impl MotionConfig {
    /// Vertical launch velocity of a jump.
    #[inline]
    pub fn launch_velocity(&self) -> f32 {
        (2.0 * self.gravity * self.jump_height).sqrt() * self.jump_impulse_multiplier
    }

    /// Lateral coordinate of a lane's center.
    #[inline]
    pub fn lane_to_lateral(&self, lane: u8) -> f32 {
        (lane as f32 - START_LANE as f32) * self.lane_offset
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Lane position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneState {
    /// Current lane, always < LANE_COUNT
    pub index: u8,
    /// Smoothed lateral coordinate
    pub current_lateral: f32,
    /// Center of the current lane
    pub target_lateral: f32,
}

/// Vertical motion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerticalState {
    /// Vertical velocity (positive is up)
    pub velocity: f32,
    /// Resting on walkable ground after the last move
    pub grounded: bool,
    /// Continuous time airborne; 0 exactly when grounded
    pub air_time: f32,
    /// Sim time the body was last grounded (None once a jump consumed it)
    pub last_grounded_at: Option<f32>,
    /// Sim time of the pending buffered jump request
    pub last_jump_requested_at: Option<f32>,
}

/// Per-tick inputs from the other components.
#[derive(Clone, Copy, Debug)]
pub struct MotionInput<'a> {
    /// Commands fired by the gesture classifier this tick
    pub commands: &'a [GestureCommand],
    /// Session forward speed
    pub forward_speed: f32,
    /// Is the session running (forward motion enabled)?
    pub running: bool,
}

/// Read-only per-tick output for collision handling and presentation.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct MotionOutput {
    /// Displacement requested from the mover
    pub displacement: Vec3,
    /// Displacement the mover actually applied
    pub actual: Vec3,
    /// Body position after the move
    pub position: Vec3,
    /// Grounded after the move
    pub grounded: bool,
    /// Vertical velocity after the tick
    pub vertical_velocity: f32,
    /// Lane index change this tick
    pub lane_delta: i8,
    /// Smoothed lateral coordinate
    pub lateral: f32,
    /// A jump launched this tick
    pub jumped: bool,
    /// The body landed this tick
    pub landed: bool,
    /// The mover reported hazard contact
    pub hazard_contact: bool,
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Lane-change and jump controller.
#[derive(Clone, Debug)]
pub struct MotionController {
    config: MotionConfig,
    lane: LaneState,
    vertical: VerticalState,
    pending_events: Vec<SimEventData>,
}

impl MotionController {
    /// Create a controller with the body in the center lane, grounded.
    pub fn new(config: MotionConfig) -> Self {
        let lateral = config.lane_to_lateral(START_LANE);
        Self {
            lane: LaneState {
                index: START_LANE,
                current_lateral: lateral,
                target_lateral: lateral,
            },
            vertical: VerticalState {
                velocity: config.grounded_velocity,
                grounded: true,
                air_time: 0.0,
                last_grounded_at: Some(0.0),
                last_jump_requested_at: None,
            },
            config,
            pending_events: Vec::new(),
        }
    }

    /// Tuning in use.
    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Lane state.
    pub fn lane(&self) -> &LaneState {
        &self.lane
    }

    /// Vertical state.
    pub fn vertical(&self) -> &VerticalState {
        &self.vertical
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<SimEventData> {
        std::mem::take(&mut self.pending_events)
    }

    /// Advance one tick.
    ///
    /// `now` and `dt` are on the simulation clock. A non-positive `dt`
    /// (paused) leaves all state untouched.
    pub fn tick<M>(&mut self, input: &MotionInput<'_>, now: f32, dt: f32, mover: &mut M) -> MotionOutput
    where
        M: CharacterMover + ?Sized,
    {
        if dt <= 0.0 {
            return MotionOutput {
                position: mover.position(),
                grounded: self.vertical.grounded,
                vertical_velocity: self.vertical.velocity,
                lateral: self.lane.current_lateral,
                ..MotionOutput::default()
            };
        }

        // 1. Commands
        let lane_before = self.lane.index;
        for command in input.commands {
            match *command {
                GestureCommand::Lateral(direction) => self.shift_lane(direction),
                GestureCommand::Jump => {
                    self.vertical.last_jump_requested_at = Some(now);
                    self.pending_events.push(SimEventData::JumpRequested);
                }
            }
        }

        // 2. Buffered jump
        let jumped = self.try_jump(now);

        // 3. Gravity
        if !self.vertical.grounded {
            self.vertical.air_time += dt;
            self.vertical.velocity -= self.config.gravity * self.gravity_multiplier() * dt;
        }

        // 4. Ground snap
        let snap = if jumped {
            0.0
        } else {
            self.ground_snap(dt, mover)
        };

        // 5. Lateral smoothing
        let t = 1.0 - (-self.config.lane_change_speed * dt).exp();
        self.lane.current_lateral += (self.lane.target_lateral - self.lane.current_lateral) * t;
        let dx = self.lane.current_lateral - mover.position().x;

        // 6. Forward
        let dz = if input.running {
            self.config.base_forward_speed.max(input.forward_speed) * dt
        } else {
            0.0
        };

        // 7. One composed move
        let displacement = Vec3::new(dx, self.vertical.velocity * dt + snap, dz);
        let outcome = mover.move_body(displacement);
        let landed = self.apply_grounding(outcome.grounded, now);

        MotionOutput {
            displacement,
            actual: outcome.actual,
            position: mover.position(),
            grounded: self.vertical.grounded,
            vertical_velocity: self.vertical.velocity,
            lane_delta: self.lane.index as i8 - lane_before as i8,
            lateral: self.lane.current_lateral,
            jumped,
            landed,
            hazard_contact: outcome.hazard_contact,
        }
    }

    fn shift_lane(&mut self, direction: LaneDirection) {
        let from = self.lane.index;
        let to = (from as i8 + direction.step()).clamp(0, LANE_COUNT as i8 - 1) as u8;
        if to == from {
            debug!(?direction, lane = from, "Lane change at edge ignored");
            return;
        }

        self.lane.index = to;
        self.lane.target_lateral = self.config.lane_to_lateral(to);
        self.pending_events.push(SimEventData::LaneChanged {
            direction,
            from_lane: from,
            to_lane: to,
        });
    }

    fn try_jump(&mut self, now: f32) -> bool {
        let Some(requested_at) = self.vertical.last_jump_requested_at else {
            return false;
        };

        if now - requested_at > self.config.jump_buffer {
            self.vertical.last_jump_requested_at = None;
            self.pending_events.push(SimEventData::JumpExpired);
            return false;
        }

        let grounded = self.vertical.grounded;
        let in_coyote = self.vertical
            .last_grounded_at
            .is_some_and(|t| now - t <= self.config.coyote_time);
        if !grounded && !in_coyote {
            return false;
        }

        let launch_velocity = self.config.launch_velocity();
        self.vertical.velocity = launch_velocity;
        self.vertical.grounded = false;
        self.vertical.last_grounded_at = None;
        self.vertical.last_jump_requested_at = None;
        self.pending_events.push(SimEventData::JumpExecuted {
            launch_velocity,
            coyote: !grounded,
        });
        true
    }

    fn gravity_multiplier(&self) -> f32 {
        let base = if self.vertical.velocity > 0.0 {
            self.config.rise_gravity_multiplier
        } else {
            self.config.fall_gravity_multiplier
        };

        if self.vertical.air_time > self.config.max_air_time {
            base * self.config.air_time_gravity_boost
        } else {
            base
        }
    }

    /// Returns the corrective vertical displacement.
    fn ground_snap<M>(&mut self, dt: f32, mover: &M) -> f32
    where
        M: CharacterMover + ?Sized,
    {
        if self.vertical.grounded || self.vertical.velocity > 0.0 {
            return 0.0;
        }

        let fall_distance = -self.vertical.velocity * dt;
        match mover.probe_ground(self.config.snap_distance + fall_distance) {
            Some(distance) => {
                self.vertical.velocity = self.vertical.velocity.min(-self.config.min_descent_speed);
                -distance.min(self.config.snap_correction)
            }
            None => 0.0,
        }
    }

    /// Returns true if this move was a landing.
    fn apply_grounding(&mut self, grounded: bool, now: f32) -> bool {
        if !grounded {
            self.vertical.grounded = false;
            return false;
        }

        let landed = !self.vertical.grounded;
        if landed {
            self.pending_events.push(SimEventData::Landed {
                air_time: self.vertical.air_time,
            });
        }

        self.vertical.grounded = true;
        self.vertical.air_time = 0.0;
        self.vertical.last_grounded_at = Some(now);
        if self.vertical.velocity < 0.0 {
            self.vertical.velocity = self.config.grounded_velocity;
        }
        landed
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::collision::{FlatCorridor, MoveOutcome};
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    /// Mover whose floor can be removed, to walk off a ledge.
    struct LedgeMover {
        position: Vec3,
        floor: bool,
    }

    impl CharacterMover for LedgeMover {
        fn move_body(&mut self, displacement: Vec3) -> MoveOutcome {
            let before = self.position;
            self.position = self.position + displacement;
            let grounded = self.floor && self.position.y <= 0.0;
            if grounded {
                self.position.y = 0.0;
            }
            MoveOutcome {
                actual: self.position - before,
                grounded,
                hazard_contact: false,
            }
        }

        fn probe_ground(&self, max_distance: f32) -> Option<f32> {
            (self.floor && self.position.y <= max_distance).then_some(self.position.y.max(0.0))
        }

        fn position(&self) -> Vec3 {
            self.position
        }

        fn place(&mut self, position: Vec3) {
            self.position = position;
        }
    }

    fn idle(running: bool) -> MotionInput<'static> {
        MotionInput {
            commands: &[],
            forward_speed: 6.0,
            running,
        }
    }

    fn run_ticks<M: CharacterMover>(
        controller: &mut MotionController,
        mover: &mut M,
        start_tick: u32,
        ticks: u32,
    ) -> MotionOutput {
        let mut out = MotionOutput::default();
        for i in start_tick..start_tick + ticks {
            out = controller.tick(&idle(true), i as f32 * DT, DT, mover);
        }
        out
    }

    #[test]
    fn test_launch_velocity() {
        let config = MotionConfig {
            gravity: 30.0,
            jump_height: 2.2,
            jump_impulse_multiplier: 1.10,
            ..MotionConfig::default()
        };
        // sqrt(2 * 30 * 2.2) * 1.10
        assert!((config.launch_velocity() - 12.6381).abs() < 0.01);
    }

    #[test]
    fn test_lane_mapping() {
        let config = MotionConfig::default();
        assert_eq!(config.lane_to_lateral(0), -1.0);
        assert_eq!(config.lane_to_lateral(1), 0.0);
        assert_eq!(config.lane_to_lateral(2), 1.0);
    }

    #[test]
    fn test_right_swipe_converges_to_lane_two() {
        let mut controller = MotionController::new(MotionConfig::default());
        let mut corridor = FlatCorridor::new(Vec3::ZERO);

        let swipe = [GestureCommand::Lateral(LaneDirection::Right)];
        let input = MotionInput { commands: &swipe, ..idle(true) };
        let first = controller.tick(&input, DT, DT, &mut corridor);

        assert_eq!(controller.lane().index, 2);
        assert_eq!(controller.lane().target_lateral, 1.0);
        assert_eq!(first.lane_delta, 1);
        // Smoothed, never snapped
        assert!(first.lateral > 0.0 && first.lateral < 1.0);

        let out = run_ticks(&mut controller, &mut corridor, 2, 120);
        assert!((out.lateral - 1.0).abs() < 1e-3);
        assert!((corridor.position().x - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_swipe_left_at_lane_zero_is_noop() {
        let mut controller = MotionController::new(MotionConfig::default());
        let mut corridor = FlatCorridor::new(Vec3::ZERO);
        let left = [
            GestureCommand::Lateral(LaneDirection::Left),
            GestureCommand::Lateral(LaneDirection::Left),
        ];
        let out = controller.tick(&MotionInput { commands: &left, ..idle(true) }, DT, DT, &mut corridor);

        assert_eq!(controller.lane().index, 0);
        assert_eq!(out.lane_delta, -1);
        let events = controller.take_events();
        assert_eq!(
            events.iter().filter(|e| matches!(e, SimEventData::LaneChanged { .. })).count(),
            1
        );
    }

    #[test]
    fn test_grounded_jump_executes() {
        let config = MotionConfig::default();
        let launch = config.launch_velocity();
        let mut controller = MotionController::new(config);
        let mut corridor = FlatCorridor::new(Vec3::ZERO);
        run_ticks(&mut controller, &mut corridor, 1, 5);

        let jump = [GestureCommand::Jump];
        let out = controller.tick(&MotionInput { commands: &jump, ..idle(true) }, 6.0 * DT, DT, &mut corridor);

        assert!(out.jumped);
        assert!(!out.grounded);
        assert!(corridor.position().y > 0.0);
        // One tick of rise gravity already applied
        assert!((out.vertical_velocity - (launch - 30.0 * DT)).abs() < 1e-3);
        assert!(controller.vertical().last_jump_requested_at.is_none());
    }

    #[test]
    fn test_jump_arc_lands_and_resets_air_time() {
        let mut controller = MotionController::new(MotionConfig::default());
        let mut corridor = FlatCorridor::new(Vec3::ZERO);
        let jump = [GestureCommand::Jump];
        controller.tick(&MotionInput { commands: &jump, ..idle(true) }, DT, DT, &mut corridor);

        let mut apex = 0.0f32;
        let mut landed_at = None;
        for i in 2..200 {
            let out = controller.tick(&idle(true), i as f32 * DT, DT, &mut corridor);
            apex = apex.max(corridor.position().y);
            if out.landed {
                landed_at = Some(i);
                break;
            }
            assert!(controller.vertical().air_time > 0.0);
        }

        assert!(landed_at.is_some());
        assert!(apex > 2.0, "apex {apex} should reach about jump height");
        assert!(controller.vertical().grounded);
        assert_eq!(controller.vertical().air_time, 0.0);
        assert_eq!(controller.vertical().velocity, -1.0);
    }

    #[test]
    fn test_asymmetric_gravity() {
        let config = MotionConfig::default();
        let mut controller = MotionController::new(config.clone());
        let mut corridor = FlatCorridor::new(Vec3::ZERO);
        let jump = [GestureCommand::Jump];
        controller.tick(&MotionInput { commands: &jump, ..idle(true) }, DT, DT, &mut corridor);

        // Rising
        let v0 = controller.vertical().velocity;
        controller.tick(&idle(true), 2.0 * DT, DT, &mut corridor);
        let rise_step = v0 - controller.vertical().velocity;
        assert!((rise_step - config.gravity * config.rise_gravity_multiplier * DT).abs() < 1e-3);

        // Advance to the descent
        let mut i = 3;
        while controller.vertical().velocity > 0.0 {
            controller.tick(&idle(true), i as f32 * DT, DT, &mut corridor);
            i += 1;
        }
        let v1 = controller.vertical().velocity;
        controller.tick(&idle(true), i as f32 * DT, DT, &mut corridor);
        let fall_step = v1 - controller.vertical().velocity;
        assert!((fall_step - config.gravity * config.fall_gravity_multiplier * DT).abs() < 1e-3);
    }

    #[test]
    fn test_air_time_boost() {
        let config = MotionConfig {
            max_air_time: 0.1,
            ..MotionConfig::default()
        };
        let mut controller = MotionController::new(config.clone());
        // Start far above the ground so the body stays airborne
        let mut corridor = FlatCorridor::new(Vec3::new(0.0, 100.0, 0.0));
        controller.tick(&idle(true), DT, DT, &mut corridor);
        assert!(!controller.vertical().grounded);

        let mut i = 2;
        while controller.vertical().air_time <= config.max_air_time {
            controller.tick(&idle(true), i as f32 * DT, DT, &mut corridor);
            i += 1;
        }
        let v = controller.vertical().velocity;
        controller.tick(&idle(true), i as f32 * DT, DT, &mut corridor);
        let step = v - controller.vertical().velocity;
        let boosted = config.gravity * config.fall_gravity_multiplier * config.air_time_gravity_boost * DT;
        assert!((step - boosted).abs() < 1e-3);
    }

    #[test]
    fn test_jump_request_in_air_expires() {
        let config = MotionConfig::default();
        let buffer_ticks = (config.jump_buffer / DT).ceil() as u32 + 2;
        let mut controller = MotionController::new(config);
        let mut corridor = FlatCorridor::new(Vec3::new(0.0, 50.0, 0.0));

        // Leave the ground for longer than coyote time
        run_ticks(&mut controller, &mut corridor, 1, 20);
        controller.take_events();

        let jump = [GestureCommand::Jump];
        controller.tick(&MotionInput { commands: &jump, ..idle(true) }, 21.0 * DT, DT, &mut corridor);
        run_ticks(&mut controller, &mut corridor, 22, buffer_ticks);

        assert!(controller.vertical().velocity < 0.0);
        assert!(controller.vertical().last_jump_requested_at.is_none());
        let events = controller.take_events();
        assert!(events.contains(&SimEventData::JumpExpired));
        assert!(!events.iter().any(|e| matches!(e, SimEventData::JumpExecuted { .. })));
    }

    #[test]
    fn test_buffered_jump_fires_on_landing() {
        let mut controller = MotionController::new(MotionConfig::default());
        // Slightly above the floor, falling
        let mut corridor = FlatCorridor::new(Vec3::new(0.0, 0.3, 0.0));
        controller.tick(&idle(true), DT, DT, &mut corridor);
        // No coyote credit from the spawn
        controller.vertical.last_grounded_at = None;

        let jump = [GestureCommand::Jump];
        controller.tick(&MotionInput { commands: &jump, ..idle(true) }, 2.0 * DT, DT, &mut corridor);

        let mut jumped = false;
        for i in 3..12 {
            if controller.tick(&idle(true), i as f32 * DT, DT, &mut corridor).jumped {
                jumped = true;
                break;
            }
        }
        assert!(jumped, "request made before landing should fire once grounded");
    }

    #[test]
    fn test_coyote_jump() {
        let config = MotionConfig::default();
        let mut controller = MotionController::new(config.clone());
        let mut mover = LedgeMover { position: Vec3::ZERO, floor: true };
        run_ticks(&mut controller, &mut mover, 1, 5);

        // Walk off the ledge
        mover.floor = false;
        run_ticks(&mut controller, &mut mover, 6, 2);
        assert!(!controller.vertical().grounded);

        let jump = [GestureCommand::Jump];
        let out = controller.tick(&MotionInput { commands: &jump, ..idle(true) }, 8.0 * DT, DT, &mut mover);
        assert!(out.jumped);
        assert!(controller
            .take_events()
            .contains(&SimEventData::JumpExecuted { launch_velocity: config.launch_velocity(), coyote: true }));

        // Coyote window consumed: no second jump in the same airtime
        let out = controller.tick(&MotionInput { commands: &jump, ..idle(true) }, 9.0 * DT, DT, &mut mover);
        assert!(!out.jumped);
    }

    #[test]
    fn test_no_jump_after_coyote_window() {
        let mut controller = MotionController::new(MotionConfig::default());
        let mut mover = LedgeMover { position: Vec3::ZERO, floor: true };
        run_ticks(&mut controller, &mut mover, 1, 5);

        mover.floor = false;
        // 0.2s airborne, double the coyote window
        run_ticks(&mut controller, &mut mover, 6, 12);

        let jump = [GestureCommand::Jump];
        let out = controller.tick(&MotionInput { commands: &jump, ..idle(true) }, 18.0 * DT, DT, &mut mover);
        assert!(!out.jumped);
    }

    #[test]
    fn test_ground_snap_enforces_min_descent() {
        let config = MotionConfig::default();
        let mut controller = MotionController::new(config.clone());
        let mut corridor = FlatCorridor::new(Vec3::new(0.0, 0.1, 0.0));
        // Drifting down slowly just above the floor
        controller.vertical.grounded = false;
        controller.vertical.velocity = -0.5;

        let out = controller.tick(&idle(true), DT, DT, &mut corridor);
        // Snap hit: velocity clamped to at least min descent before landing
        assert!(out.displacement.y <= -config.min_descent_speed * DT);
    }

    #[test]
    fn test_forward_only_while_running() {
        let mut controller = MotionController::new(MotionConfig::default());
        let mut corridor = FlatCorridor::new(Vec3::ZERO);

        let out = controller.tick(&idle(false), DT, DT, &mut corridor);
        assert_eq!(out.displacement.z, 0.0);

        let fast = MotionInput { forward_speed: 12.0, ..idle(true) };
        let out = controller.tick(&fast, 2.0 * DT, DT, &mut corridor);
        assert!((out.displacement.z - 12.0 * DT).abs() < 1e-6);

        // Session speed below the floor uses the base speed
        let slow = MotionInput { forward_speed: 1.0, ..idle(true) };
        let out = controller.tick(&slow, 3.0 * DT, DT, &mut corridor);
        assert!((out.displacement.z - 6.0 * DT).abs() < 1e-6);
    }

    #[test]
    fn test_zero_dt_freezes_state() {
        let mut controller = MotionController::new(MotionConfig::default());
        let mut corridor = FlatCorridor::new(Vec3::ZERO);
        let swipe = [GestureCommand::Lateral(LaneDirection::Right)];

        let out = controller.tick(&MotionInput { commands: &swipe, ..idle(true) }, 0.0, 0.0, &mut corridor);

        assert_eq!(out.displacement, Vec3::ZERO);
        assert_eq!(controller.lane().index, START_LANE);
        assert_eq!(corridor.position(), Vec3::ZERO);
    }

    proptest! {
        #[test]
        fn prop_lane_index_stays_in_range(steps in proptest::collection::vec(any::<bool>(), 0..64)) {
            let mut controller = MotionController::new(MotionConfig::default());
            let mut corridor = FlatCorridor::new(Vec3::ZERO);

            for (i, right) in steps.into_iter().enumerate() {
                let before = controller.lane().index;
                let direction = if right { LaneDirection::Right } else { LaneDirection::Left };
                let commands = [GestureCommand::Lateral(direction)];
                let input = MotionInput { commands: &commands, ..idle(true) };
                controller.tick(&input, (i + 1) as f32 * DT, DT, &mut corridor);

                let after = controller.lane().index;
                prop_assert!(after < LANE_COUNT);
                let expected = (before as i8 + direction.step()).clamp(0, LANE_COUNT as i8 - 1) as u8;
                prop_assert_eq!(after, expected);
                prop_assert_eq!(controller.lane().target_lateral, controller.config().lane_to_lateral(after));
            }
        }
    }
}
