//! Collision Contract
//!
//! The core does not resolve collisions itself. It hands one composed
//! displacement per tick to a [`CharacterMover`] and consumes the outcome.
//!
//! [`FlatCorridor`] is a reference mover: a flat walkable plane at y = 0
//! with box-shaped hazards. The demo binary and the tests run on it.

use crate::core::vec3::Vec3;
use crate::game::motion::START_LANE;
use crate::game::world::WorldStreamer;

/// Result of one move.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct MoveOutcome {
    /// Displacement actually applied after collision resolution
    pub actual: Vec3,
    /// Body ended the move resting on a walkable surface
    pub grounded: bool,
    /// Body touched a hazard during the move
    pub hazard_contact: bool,
}

/// Collision-aware movement primitive for the controlled body.
pub trait CharacterMover {
    /// Move the body along `displacement`, resolving collisions.
    fn move_body(&mut self, displacement: Vec3) -> MoveOutcome;

    /// Distance from the body down to walkable ground, if within `max_distance`.
    fn probe_ground(&self, max_distance: f32) -> Option<f32>;

    /// Current body position (feet).
    fn position(&self) -> Vec3;

    /// Teleport the body, e.g. on run reset.
    fn place(&mut self, position: Vec3);

    /// The active tile window changed.
    ///
    /// Movers that own their own collision geometry can ignore this.
    fn on_tiles_changed(&mut self, _world: &WorldStreamer) {}
}

/// Axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create from center and half extents.
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Check if two boxes overlap (touching counts).
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// Flat corridor with box hazards.
#[derive(Clone, Debug)]
pub struct FlatCorridor {
    position: Vec3,
    half_extents: Vec3,
    lane_offset: f32,
    hazards: Vec<Aabb>,
}

impl FlatCorridor {
    /// Default body half extents (width, half height, depth).
    pub const BODY_HALF_EXTENTS: Vec3 = Vec3::new(0.3, 0.9, 0.3);

    /// Half extents of a lane hazard (low barrier, clearable by a jump).
    pub const HAZARD_HALF_EXTENTS: Vec3 = Vec3::new(0.35, 0.4, 0.25);

    /// Create a corridor with the body standing at `start`.
    pub fn new(start: Vec3) -> Self {
        Self {
            position: start,
            half_extents: Self::BODY_HALF_EXTENTS,
            lane_offset: 1.0,
            hazards: Vec::new(),
        }
    }

    /// Set the lane spacing used to place tile hazards.
    pub fn with_lane_offset(mut self, lane_offset: f32) -> Self {
        self.lane_offset = lane_offset;
        self
    }

    /// Hazard box for a lane of a tile placed at `tile_z`.
    pub fn lane_hazard(&self, lane: u8, tile_z: f32) -> Aabb {
        let x = (lane as f32 - START_LANE as f32) * self.lane_offset;
        let half = Self::HAZARD_HALF_EXTENTS;
        Aabb::from_center(Vec3::new(x, half.y, tile_z), half)
    }

    /// Body bounds at a given feet position.
    pub fn body_bounds_at(&self, feet: Vec3) -> Aabb {
        let center = Vec3::new(feet.x, feet.y + self.half_extents.y, feet.z);
        Aabb::from_center(center, self.half_extents)
    }

    /// Replace the hazard set.
    pub fn set_hazards(&mut self, hazards: impl IntoIterator<Item = Aabb>) {
        self.hazards.clear();
        self.hazards.extend(hazards);
    }

    /// Add a single hazard.
    pub fn add_hazard(&mut self, hazard: Aabb) {
        self.hazards.push(hazard);
    }

    /// Current hazards.
    pub fn hazards(&self) -> &[Aabb] {
        &self.hazards
    }

    fn touches_hazard(&self, feet: Vec3) -> bool {
        let body = self.body_bounds_at(feet);
        self.hazards.iter().any(|h| h.overlaps(&body))
    }
}

impl CharacterMover for FlatCorridor {
    fn move_body(&mut self, displacement: Vec3) -> MoveOutcome {
        let mut target = self.position + displacement;

        // The floor is the only solid surface
        let grounded = target.y <= 0.0;
        if grounded {
            target.y = 0.0;
        }

        let actual = target - self.position;
        self.position = target;

        MoveOutcome {
            actual,
            grounded,
            hazard_contact: self.touches_hazard(target),
        }
    }

    fn probe_ground(&self, max_distance: f32) -> Option<f32> {
        let height = self.position.y.max(0.0);
        (height <= max_distance).then_some(height)
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn place(&mut self, position: Vec3) {
        self.position = position;
    }

    fn on_tiles_changed(&mut self, world: &WorldStreamer) {
        let mut hazards = Vec::new();
        for (_, tile) in world.active_window() {
            if let Some(kind) = world.kind_of(tile) {
                hazards.extend(kind.hazard_lanes.iter().map(|&lane| self.lane_hazard(lane, tile.z)));
            }
        }
        self.hazards = hazards;
    }
}
