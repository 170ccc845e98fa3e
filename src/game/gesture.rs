//! Gesture Classification
//!
//! Turns raw pointer samples into at most one command per gesture:
//! a lateral swipe (left/right) or a jump (upward swipe).
//!
//! ## Rules
//!
//! - Only one pointer is tracked at a time; other pointers are ignored.
//! - A gesture that starts over blocking UI never fires.
//! - A gesture older than `max_swipe_duration` is dropped.
//! - Upward swipes win over horizontal ones when both qualify.
//! - Timing uses the real clock, so a pause does not stretch a swipe window.
//! - While paused nothing is sampled, and pausing discards the open gesture.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::vec3::Vec2;
use crate::game::input::{KeyCommand, PointerId, PointerPhase, PointerSample};

/// Lateral direction of a lane change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneDirection {
    /// Towards lane 0
    Left,
    /// Towards the last lane
    Right,
}

impl LaneDirection {
    /// Signed lane step (-1 or +1).
    #[inline]
    pub fn step(self) -> i8 {
        match self {
            LaneDirection::Left => -1,
            LaneDirection::Right => 1,
        }
    }
}

/// Command produced by a classified gesture or a fallback key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureCommand {
    /// Change lane by one
    Lateral(LaneDirection),
    /// Request a jump
    Jump,
}

impl From<KeyCommand> for GestureCommand {
    fn from(key: KeyCommand) -> Self {
        match key {
            KeyCommand::Left => GestureCommand::Lateral(LaneDirection::Left),
            KeyCommand::Right => GestureCommand::Lateral(LaneDirection::Right),
            KeyCommand::Jump => GestureCommand::Jump,
        }
    }
}

/// Gesture thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Base swipe distance in pixels
    pub min_swipe_distance: f32,
    /// Physical minimum swipe length, used when `screen_dpi` is known
    pub min_swipe_inches: f32,
    /// Screen density (dots per inch), if the host reports one
    pub screen_dpi: Option<f32>,
    /// Gestures older than this (seconds) are dropped
    pub max_swipe_duration: f32,
    /// Maximum deviation from the swipe axis, in degrees
    pub angle_threshold_deg: f32,
    /// Minimum real time between two fired commands (seconds)
    pub command_cooldown: f32,
    /// Fire as soon as a move sample qualifies instead of waiting for release
    pub fire_on_move: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            min_swipe_distance: 50.0,
            min_swipe_inches: 0.25,
            screen_dpi: None,
            max_swipe_duration: 0.5,
            angle_threshold_deg: 30.0,
            command_cooldown: 0.08,
            fire_on_move: true,
        }
    }
}

impl GestureConfig {
    /// Required swipe magnitude in pixels.
    ///
    /// The base distance, raised to the density-scaled minimum when the
    /// screen density is known.
    pub fn required_distance(&self) -> f32 {
        match self.screen_dpi {
            Some(dpi) if dpi > 0.0 => self.min_swipe_distance.max(dpi * self.min_swipe_inches),
            _ => self.min_swipe_distance,
        }
    }
}

/// The single in-flight gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
struct GestureSession {
    pointer_id: PointerId,
    start_position: Vec2,
    start_time: f32,
    started_over_blocking_ui: bool,
}

impl GestureSession {
    #[inline]
    fn expired(&self, now: f32, max_duration: f32) -> bool {
        now - self.start_time > max_duration
    }
}

/// Classifies pointer samples into commands.
#[derive(Clone, Debug)]
pub struct GestureClassifier {
    config: GestureConfig,
    required_distance: f32,
    session: Option<GestureSession>,
    last_fired_at: Option<f32>,
}

impl GestureClassifier {
    /// Create a classifier with the given thresholds.
    pub fn new(config: GestureConfig) -> Self {
        let required_distance = config.required_distance();
        Self {
            config,
            required_distance,
            session: None,
            last_fired_at: None,
        }
    }

    /// Thresholds in use.
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Is a gesture currently being tracked?
    #[inline]
    pub fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    /// Feed one pointer sample.
    ///
    /// Returns the command fired by this sample, if any.
    /// While `paused` the sample is ignored entirely.
    pub fn handle_sample(&mut self, sample: &PointerSample, paused: bool) -> Option<GestureCommand> {
        if paused {
            return None;
        }

        match sample.phase {
            PointerPhase::Begin => {
                self.begin(sample);
                None
            }
            PointerPhase::Move => self.sample_move(sample),
            PointerPhase::End => self.end(sample),
            PointerPhase::Cancel => {
                if self.owns(sample.pointer_id) {
                    self.session = None;
                }
                None
            }
        }
    }

    /// Feed one fallback key command.
    ///
    /// Subject to the same pause gating and cooldown as gestures.
    pub fn handle_key(&mut self, key: KeyCommand, now: f32, paused: bool) -> Option<GestureCommand> {
        if paused || self.in_cooldown(now) {
            return None;
        }
        Some(self.fire(key.into(), now))
    }

    /// Pause-changed notification.
    ///
    /// Pausing discards the in-flight gesture without firing.
    pub fn on_pause_changed(&mut self, paused: bool) {
        if paused && self.session.take().is_some() {
            debug!("Discarded in-flight gesture on pause");
        }
    }

    /// Classify a displacement from the gesture start.
    ///
    /// Vertical-up is checked first.
    pub fn classify(&self, delta: Vec2) -> Option<GestureCommand> {
        let required = self.required_distance;
        let threshold = self.config.angle_threshold_deg;

        if delta.y > 0.0 && delta.y >= required {
            let from_vertical = delta.x.abs().atan2(delta.y).to_degrees();
            if from_vertical <= threshold {
                return Some(GestureCommand::Jump);
            }
        }

        if delta.x.abs() >= required {
            let from_horizontal = delta.y.abs().atan2(delta.x.abs()).to_degrees();
            if from_horizontal <= threshold {
                let direction = if delta.x > 0.0 {
                    LaneDirection::Right
                } else {
                    LaneDirection::Left
                };
                return Some(GestureCommand::Lateral(direction));
            }
        }

        None
    }

    fn begin(&mut self, sample: &PointerSample) {
        self.drop_stale(sample.time);
        if self.session.is_some() {
            // Single-pointer tracking
            return;
        }

        self.session = Some(GestureSession {
            pointer_id: sample.pointer_id,
            start_position: sample.position,
            start_time: sample.time,
            started_over_blocking_ui: sample.over_blocking_ui,
        });
    }

    fn sample_move(&mut self, sample: &PointerSample) -> Option<GestureCommand> {
        self.drop_stale(sample.time);
        let session = self.active_session(sample.pointer_id)?;

        if session.started_over_blocking_ui || !self.config.fire_on_move {
            return None;
        }

        let command = self.classify(sample.position - session.start_position)?;
        if self.in_cooldown(sample.time) {
            // Keep tracking: the release may still land outside the cooldown
            return None;
        }

        self.session = None;
        Some(self.fire(command, sample.time))
    }

    fn end(&mut self, sample: &PointerSample) -> Option<GestureCommand> {
        self.drop_stale(sample.time);
        let session = self.active_session(sample.pointer_id)?;
        self.session = None;

        if session.started_over_blocking_ui {
            return None;
        }

        let command = self.classify(sample.position - session.start_position)?;
        if self.in_cooldown(sample.time) {
            return None;
        }

        Some(self.fire(command, sample.time))
    }

    /// Close a session that outlived the swipe window, whichever pointer
    /// the current sample belongs to. A lost release must not hold the
    /// single tracking slot.
    fn drop_stale(&mut self, now: f32) {
        let max_duration = self.config.max_swipe_duration;
        if self.session.is_some_and(|s| s.expired(now, max_duration)) {
            debug!("Gesture exceeded max duration, dropped");
            self.session = None;
        }
    }

    fn fire(&mut self, command: GestureCommand, now: f32) -> GestureCommand {
        self.last_fired_at = Some(now);
        debug!(?command, "Gesture fired");
        command
    }

    #[inline]
    fn owns(&self, pointer_id: PointerId) -> bool {
        self.session.is_some_and(|s| s.pointer_id == pointer_id)
    }

    #[inline]
    fn active_session(&self, pointer_id: PointerId) -> Option<GestureSession> {
        self.session.filter(|s| s.pointer_id == pointer_id)
    }

    #[inline]
    fn in_cooldown(&self, now: f32) -> bool {
        self.last_fired_at
            .is_some_and(|t| now - t < self.config.command_cooldown)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const P0: PointerId = PointerId(0);
    const P1: PointerId = PointerId(1);

    fn sample(id: PointerId, phase: PointerPhase, x: f32, y: f32, t: f32) -> PointerSample {
        PointerSample::new(id, phase, Vec2::new(x, y), t)
    }

    /// Begin at origin, end at (dx, dy) after `dt` seconds.
    fn swipe(c: &mut GestureClassifier, dx: f32, dy: f32, t0: f32, dt: f32) -> Option<GestureCommand> {
        assert!(c.handle_sample(&sample(P0, PointerPhase::Begin, 0.0, 0.0, t0), false).is_none());
        c.handle_sample(&sample(P0, PointerPhase::End, dx, dy, t0 + dt), false)
    }

    fn classifier() -> GestureClassifier {
        GestureClassifier::new(GestureConfig::default())
    }

    #[test]
    fn test_horizontal_swipes() {
        let mut c = classifier();
        assert_eq!(
            swipe(&mut c, 120.0, 10.0, 0.0, 0.1),
            Some(GestureCommand::Lateral(LaneDirection::Right))
        );
        assert_eq!(
            swipe(&mut c, -120.0, -10.0, 1.0, 0.1),
            Some(GestureCommand::Lateral(LaneDirection::Left))
        );
        assert!(!c.is_tracking());
    }

    #[test]
    fn test_upward_swipe_is_jump() {
        let mut c = classifier();
        assert_eq!(swipe(&mut c, 5.0, 90.0, 0.0, 0.1), Some(GestureCommand::Jump));
    }

    #[test]
    fn test_downward_swipe_ignored() {
        let mut c = classifier();
        assert_eq!(swipe(&mut c, 0.0, -90.0, 0.0, 0.1), None);
    }

    #[test]
    fn test_short_or_diagonal_swipe_ignored() {
        let mut c = classifier();
        // Too short
        assert_eq!(swipe(&mut c, 30.0, 0.0, 0.0, 0.1), None);
        // 45 degrees: outside both 30-degree cones
        assert_eq!(swipe(&mut c, 100.0, 100.0, 1.0, 0.1), None);
    }

    #[test]
    fn test_vertical_priority_with_wide_threshold() {
        let mut c = GestureClassifier::new(GestureConfig {
            angle_threshold_deg: 60.0,
            ..GestureConfig::default()
        });
        // Qualifies for both cones; vertical wins
        assert_eq!(swipe(&mut c, 100.0, 100.0, 0.0, 0.1), Some(GestureCommand::Jump));
    }

    #[test]
    fn test_expired_gesture_dropped() {
        let mut c = classifier();
        assert_eq!(swipe(&mut c, 200.0, 0.0, 0.0, 0.8), None);
        assert!(!c.is_tracking());
    }

    #[test]
    fn test_expired_on_move_clears_session() {
        let mut c = classifier();
        c.handle_sample(&sample(P0, PointerPhase::Begin, 0.0, 0.0, 0.0), false);
        assert!(c.handle_sample(&sample(P0, PointerPhase::Move, 10.0, 0.0, 0.9), false).is_none());
        assert!(!c.is_tracking());
    }

    #[test]
    fn test_stale_session_released_for_new_pointer() {
        let mut c = classifier();
        // P0 never sends End or Cancel
        c.handle_sample(&sample(P0, PointerPhase::Begin, 0.0, 0.0, 0.0), false);
        assert!(c.is_tracking());

        c.handle_sample(&sample(P1, PointerPhase::Begin, 0.0, 0.0, 10.0), false);
        assert_eq!(
            c.handle_sample(&sample(P1, PointerPhase::Move, 200.0, 0.0, 10.05), false),
            Some(GestureCommand::Lateral(LaneDirection::Right))
        );
        assert!(c.handle_sample(&sample(P1, PointerPhase::End, 200.0, 0.0, 10.1), false).is_none());
        assert!(!c.is_tracking());
    }

    #[test]
    fn test_stale_session_dropped_by_other_pointer_samples() {
        let mut c = classifier();
        c.handle_sample(&sample(P0, PointerPhase::Begin, 0.0, 0.0, 0.0), false);
        assert!(c.handle_sample(&sample(P1, PointerPhase::Move, 50.0, 0.0, 2.0), false).is_none());
        assert!(!c.is_tracking());

        c.handle_sample(&sample(P0, PointerPhase::Begin, 0.0, 0.0, 3.0), false);
        assert!(c.handle_sample(&sample(P1, PointerPhase::End, 50.0, 0.0, 5.0), false).is_none());
        assert!(!c.is_tracking());
    }

    #[test]
    fn test_blocking_ui_disqualifies_whole_gesture() {
        let mut c = classifier();
        let begin = sample(P0, PointerPhase::Begin, 0.0, 0.0, 0.0).over_ui();
        c.handle_sample(&begin, false);
        assert!(c.handle_sample(&sample(P0, PointerPhase::Move, 150.0, 0.0, 0.05), false).is_none());
        assert!(c.handle_sample(&sample(P0, PointerPhase::End, 150.0, 0.0, 0.1), false).is_none());
        assert!(!c.is_tracking());
    }

    #[test]
    fn test_second_pointer_ignored() {
        let mut c = classifier();
        c.handle_sample(&sample(P0, PointerPhase::Begin, 0.0, 0.0, 0.0), false);
        c.handle_sample(&sample(P1, PointerPhase::Begin, 500.0, 500.0, 0.01), false);
        assert!(c.handle_sample(&sample(P1, PointerPhase::End, 700.0, 500.0, 0.05), false).is_none());

        // First pointer still tracked
        assert!(c.is_tracking());
        assert_eq!(
            c.handle_sample(&sample(P0, PointerPhase::End, -100.0, 0.0, 0.1), false),
            Some(GestureCommand::Lateral(LaneDirection::Left))
        );
    }

    #[test]
    fn test_early_fire_on_move_then_end_is_silent() {
        let mut c = classifier();
        c.handle_sample(&sample(P0, PointerPhase::Begin, 0.0, 0.0, 0.0), false);
        assert!(c.handle_sample(&sample(P0, PointerPhase::Move, 20.0, 0.0, 0.02), false).is_none());
        assert_eq!(
            c.handle_sample(&sample(P0, PointerPhase::Move, 80.0, 0.0, 0.05), false),
            Some(GestureCommand::Lateral(LaneDirection::Right))
        );
        // Same gesture can't fire twice
        assert!(c.handle_sample(&sample(P0, PointerPhase::End, 300.0, 0.0, 0.2), false).is_none());
    }

    #[test]
    fn test_fire_on_move_disabled_waits_for_release() {
        let mut c = GestureClassifier::new(GestureConfig {
            fire_on_move: false,
            ..GestureConfig::default()
        });
        c.handle_sample(&sample(P0, PointerPhase::Begin, 0.0, 0.0, 0.0), false);
        assert!(c.handle_sample(&sample(P0, PointerPhase::Move, 0.0, 120.0, 0.05), false).is_none());
        assert_eq!(
            c.handle_sample(&sample(P0, PointerPhase::End, 0.0, 120.0, 0.1), false),
            Some(GestureCommand::Jump)
        );
    }

    #[test]
    fn test_pause_discards_in_flight_gesture() {
        let mut c = classifier();
        c.handle_sample(&sample(P0, PointerPhase::Begin, 0.0, 0.0, 0.0), false);
        c.on_pause_changed(true);
        assert!(!c.is_tracking());

        // Same pointer continues after resume: no session, no command
        c.on_pause_changed(false);
        assert!(c.handle_sample(&sample(P0, PointerPhase::Move, 150.0, 0.0, 0.05), false).is_none());
        assert!(c.handle_sample(&sample(P0, PointerPhase::End, 150.0, 0.0, 0.1), false).is_none());
    }

    #[test]
    fn test_paused_samples_ignored() {
        let mut c = classifier();
        assert!(c.handle_sample(&sample(P0, PointerPhase::Begin, 0.0, 0.0, 0.0), true).is_none());
        assert!(!c.is_tracking());
        assert!(c.handle_key(KeyCommand::Jump, 0.0, true).is_none());
    }

    #[test]
    fn test_cancel_clears_session() {
        let mut c = classifier();
        c.handle_sample(&sample(P0, PointerPhase::Begin, 0.0, 0.0, 0.0), false);
        c.handle_sample(&sample(P0, PointerPhase::Cancel, 0.0, 0.0, 0.01), false);
        assert!(!c.is_tracking());
    }

    #[test]
    fn test_cooldown_blocks_rapid_commands() {
        let mut c = classifier();
        assert!(swipe(&mut c, 100.0, 0.0, 0.0, 0.02).is_some());
        // 0.03s after the last command: inside the 0.08s cooldown
        assert!(swipe(&mut c, 100.0, 0.0, 0.03, 0.02).is_none());
        // Well after
        assert!(swipe(&mut c, 100.0, 0.0, 0.5, 0.02).is_some());
    }

    #[test]
    fn test_key_commands_share_cooldown() {
        let mut c = classifier();
        assert_eq!(
            c.handle_key(KeyCommand::Right, 1.0, false),
            Some(GestureCommand::Lateral(LaneDirection::Right))
        );
        assert!(c.handle_key(KeyCommand::Jump, 1.01, false).is_none());
        assert_eq!(c.handle_key(KeyCommand::Jump, 1.2, false), Some(GestureCommand::Jump));
    }

    #[test]
    fn test_density_scaled_threshold() {
        let config = GestureConfig {
            screen_dpi: Some(400.0),
            ..GestureConfig::default()
        };
        // 400 dpi * 0.25 in = 100 px
        assert!((config.required_distance() - 100.0).abs() < 1e-4);

        let mut c = GestureClassifier::new(config);
        assert_eq!(swipe(&mut c, 80.0, 0.0, 0.0, 0.1), None);
        assert!(swipe(&mut c, 110.0, 0.0, 1.0, 0.1).is_some());

        // Low density never lowers the base threshold
        let low = GestureConfig {
            screen_dpi: Some(100.0),
            ..GestureConfig::default()
        };
        assert_eq!(low.required_distance(), 50.0);
    }
}
