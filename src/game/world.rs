//! World Streaming
//!
//! Keeps a window of corridor tiles around the runner's forward coordinate.
//!
//! ## Ownership
//!
//! ```text
//! tiles:  [T0][T1][T2][T3][T4][T5] ...   arena, never shrinks
//! pool:   T4 -> T5                       parked, inactive (FIFO reuse)
//! active: T0 -> T1 -> T2 -> T3           ordered by spawn coordinate
//! ```
//!
//! Every handle is in exactly one of `pool` or `active`. Tiles are appended
//! at increasing coordinates and removed from the head only, so despawn is a
//! head check rather than a scan.

use std::collections::VecDeque;
use serde::{Serialize, Deserialize};
use tracing::{debug, error};

use crate::core::rng::DeterministicRng;
use crate::game::events::SimEventData;

/// Coordinate parked tiles are moved to.
pub const PARK_COORDINATE: f32 = 9999.0;

/// One entry of the tile catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileKind {
    /// Name the presentation layer maps to visuals
    pub name: String,
    /// Lanes blocked by a hazard on this tile
    #[serde(default)]
    pub hazard_lanes: Vec<u8>,
}

impl TileKind {
    /// A tile without hazards.
    pub fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            hazard_lanes: Vec::new(),
        }
    }

    /// A tile with hazards in the given lanes.
    pub fn with_hazards(name: &str, lanes: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            hazard_lanes: lanes.to_vec(),
        }
    }
}

/// Streaming configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Length of one tile along the forward axis
    pub tile_length: f32,
    /// Keep tiles spawned this far ahead of the runner
    pub spawn_ahead: f32,
    /// Keep tiles this far behind the runner
    pub despawn_behind: f32,
    /// Tiles spawned during warm-up
    pub prewarm_count: u32,
    /// Extra pooled handles allocated during warm-up
    pub extra_pool: u32,
    /// Leading tiles that always use catalog entry 0
    pub safe_start_tiles: u32,
    /// Available tile kinds
    pub catalog: Vec<TileKind>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tile_length: 5.0,
            spawn_ahead: 20.0,
            despawn_behind: 15.0,
            prewarm_count: 8,
            extra_pool: 6,
            safe_start_tiles: 4,
            catalog: vec![
                TileKind::plain("straight"),
                TileKind::plain("straight_decor"),
                TileKind::with_hazards("barrier_left", &[0]),
                TileKind::with_hazards("barrier_center", &[1]),
                TileKind::with_hazards("barrier_right", &[2]),
            ],
        }
    }
}

/// Streaming misconfiguration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    /// No tile kinds to spawn.
    #[error("tile catalog is empty")]
    EmptyCatalog,

    /// Tile length must be positive or the spawn loop never terminates.
    #[error("tile length must be positive, got {0}")]
    InvalidTileLength(f32),
}

/// Whether the streamer is running.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamerStatus {
    /// Spawning and despawning normally
    Active,
    /// Stopped because of a configuration error
    Disabled(WorldError),
}

/// Handle to a tile in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileHandle(pub u32);

/// A pooled world segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Catalog index of the current placement
    pub kind: usize,
    /// Spawn coordinate along the forward axis
    pub z: f32,
    /// In the active window?
    pub active: bool,
}

/// Spawns tiles ahead of the runner and recycles them behind.
#[derive(Clone, Debug)]
pub struct WorldStreamer {
    config: WorldConfig,
    tiles: Vec<Tile>,
    pool: VecDeque<TileHandle>,
    active: VecDeque<TileHandle>,
    next_spawn_z: f32,
    spawned_count: u64,
    rng: DeterministicRng,
    status: StreamerStatus,
    pending_events: Vec<SimEventData>,
}

impl WorldStreamer {
    /// Create a streamer and run warm-up.
    ///
    /// A bad configuration disables the streamer instead of failing.
    pub fn new(config: WorldConfig, seed: u64) -> Self {
        let status = if config.catalog.is_empty() {
            StreamerStatus::Disabled(WorldError::EmptyCatalog)
        } else if !(config.tile_length > 0.0) {
            StreamerStatus::Disabled(WorldError::InvalidTileLength(config.tile_length))
        } else {
            StreamerStatus::Active
        };

        let mut streamer = Self {
            config,
            tiles: Vec::new(),
            pool: VecDeque::new(),
            active: VecDeque::new(),
            next_spawn_z: 0.0,
            spawned_count: 0,
            rng: DeterministicRng::new(seed),
            status,
            pending_events: Vec::new(),
        };

        if let StreamerStatus::Disabled(err) = &streamer.status {
            error!("World streamer disabled: {}", err);
        } else {
            streamer.warm_up();
        }

        streamer
    }

    /// Pre-allocate the pool, then spawn the initial tiles.
    fn warm_up(&mut self) {
        let pool_size = (self.config.prewarm_count + self.config.extra_pool).max(1);
        self.tiles.reserve(pool_size as usize);
        for _ in 0..pool_size {
            let handle = self.allocate();
            self.pool.push_back(handle);
        }

        for _ in 0..self.config.prewarm_count {
            self.spawn();
        }

        debug!(
            pool = self.pool.len(),
            active = self.active.len(),
            "World streamer warmed up"
        );
    }

    /// Advance streaming for the runner's forward coordinate.
    pub fn update(&mut self, forward_z: f32) {
        if !self.is_enabled() || !forward_z.is_finite() {
            return;
        }

        while forward_z + self.config.spawn_ahead > self.next_spawn_z {
            self.spawn();
        }

        let limit = self.config.despawn_behind + self.config.tile_length;
        while let Some(&head) = self.active.front() {
            if forward_z - self.tiles[head.0 as usize].z > limit {
                self.despawn_head();
            } else {
                break;
            }
        }
    }

    fn allocate(&mut self) -> TileHandle {
        let handle = TileHandle(self.tiles.len() as u32);
        self.tiles.push(Tile {
            kind: 0,
            z: PARK_COORDINATE,
            active: false,
        });
        handle
    }

    fn pick_kind(&mut self) -> usize {
        if self.spawned_count < self.config.safe_start_tiles as u64 {
            return 0;
        }
        self.rng.choose_index(self.config.catalog.len()).unwrap_or(0)
    }

    fn spawn(&mut self) {
        let handle = match self.pool.pop_front() {
            Some(handle) => handle,
            None => {
                debug!("Tile pool empty, allocating");
                self.allocate()
            }
        };

        let kind = self.pick_kind();
        let z = self.next_spawn_z;
        let tile = &mut self.tiles[handle.0 as usize];
        tile.kind = kind;
        tile.z = z;
        tile.active = true;

        self.active.push_back(handle);
        self.next_spawn_z += self.config.tile_length;
        self.spawned_count += 1;
        self.pending_events.push(SimEventData::TileSpawned { handle, kind, z });
    }

    fn despawn_head(&mut self) {
        let Some(handle) = self.active.pop_front() else {
            return;
        };

        let tile = &mut self.tiles[handle.0 as usize];
        let z = tile.z;
        tile.active = false;
        tile.z = PARK_COORDINATE;

        self.pool.push_back(handle);
        self.pending_events.push(SimEventData::TileDespawned { handle, z });
    }

    /// Streaming configuration.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Current status.
    pub fn status(&self) -> &StreamerStatus {
        &self.status
    }

    /// Check if the streamer is running.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        matches!(self.status, StreamerStatus::Active)
    }

    /// Coordinate the next tile will be placed at.
    pub fn next_spawn_z(&self) -> f32 {
        self.next_spawn_z
    }

    /// Get a tile by handle.
    pub fn tile(&self, handle: TileHandle) -> Option<&Tile> {
        self.tiles.get(handle.0 as usize)
    }

    /// Catalog entry for a tile.
    pub fn kind_of(&self, tile: &Tile) -> Option<&TileKind> {
        self.config.catalog.get(tile.kind)
    }

    /// Active tiles, head (oldest) first.
    pub fn active_window(&self) -> impl Iterator<Item = (TileHandle, &Tile)> + '_ {
        self.active
            .iter()
            .map(move |&handle| (handle, &self.tiles[handle.0 as usize]))
    }

    /// Handles currently parked in the pool.
    pub fn pooled(&self) -> impl Iterator<Item = TileHandle> + '_ {
        self.pool.iter().copied()
    }

    /// Number of active tiles.
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Number of pooled tiles.
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    /// Total handles ever allocated.
    pub fn total_handles(&self) -> usize {
        self.tiles.len()
    }

    /// State of the tile-selection generator.
    pub fn rng_state(&self) -> [u64; 2] {
        self.rng.state()
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<SimEventData> {
        std::mem::take(&mut self.pending_events)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn active_coords(streamer: &WorldStreamer) -> Vec<f32> {
        streamer.active_window().map(|(_, t)| t.z).collect()
    }

    fn bare_config() -> WorldConfig {
        WorldConfig {
            prewarm_count: 0,
            ..WorldConfig::default()
        }
    }

    #[test]
    fn test_spawn_loop_at_origin() {
        let mut streamer = WorldStreamer::new(bare_config(), 1);
        assert_eq!(streamer.active_len(), 0);

        streamer.update(0.0);

        // 0 + 20 > next_z holds for 0, 5, 10, 15 and stops at 20
        assert_eq!(active_coords(&streamer), vec![0.0, 5.0, 10.0, 15.0]);
        assert_eq!(streamer.next_spawn_z(), 20.0);
    }

    #[test]
    fn test_warm_up_allocates_pool_and_prewarms() {
        let streamer = WorldStreamer::new(WorldConfig::default(), 1);

        assert_eq!(streamer.total_handles(), 14);
        assert_eq!(streamer.active_len(), 8);
        assert_eq!(streamer.pool_len(), 6);
        assert_eq!(streamer.next_spawn_z(), 40.0);
    }

    #[test]
    fn test_despawn_behind() {
        let mut streamer = WorldStreamer::new(bare_config(), 1);
        streamer.update(0.0);
        streamer.take_events();

        streamer.update(40.0);

        // 40 - z > 15 + 5 removes tiles below 20
        let coords = active_coords(&streamer);
        assert_eq!(coords.first().copied(), Some(20.0));
        assert_eq!(coords.last().copied(), Some(55.0));

        let despawned = streamer
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, SimEventData::TileDespawned { .. }))
            .count();
        assert_eq!(despawned, 4);

        for handle in streamer.pooled() {
            let tile = streamer.tile(handle).unwrap();
            assert!(!tile.active);
            assert_eq!(tile.z, PARK_COORDINATE);
        }
    }

    #[test]
    fn test_empty_catalog_disables() {
        let config = WorldConfig {
            catalog: Vec::new(),
            ..WorldConfig::default()
        };
        let mut streamer = WorldStreamer::new(config, 1);

        assert_eq!(streamer.status(), &StreamerStatus::Disabled(WorldError::EmptyCatalog));
        streamer.update(100.0);
        assert_eq!(streamer.active_len(), 0);
        assert_eq!(streamer.total_handles(), 0);
        assert!(streamer.take_events().is_empty());
    }

    #[test]
    fn test_zero_tile_length_disables() {
        let config = WorldConfig {
            tile_length: 0.0,
            ..WorldConfig::default()
        };
        let mut streamer = WorldStreamer::new(config, 1);
        assert!(!streamer.is_enabled());
        streamer.update(10.0);
        assert_eq!(streamer.active_len(), 0);
    }

    #[test]
    fn test_empty_pool_falls_back_to_allocation() {
        let config = WorldConfig {
            prewarm_count: 0,
            extra_pool: 0,
            ..WorldConfig::default()
        };
        let mut streamer = WorldStreamer::new(config, 1);
        assert_eq!(streamer.total_handles(), 1);

        streamer.update(0.0);
        assert_eq!(streamer.active_len(), 4);
        assert_eq!(streamer.total_handles(), 4);

        // Steady state: recycled handles cover the window
        let mut z = 0.0;
        for _ in 0..50 {
            z += 5.0;
            streamer.update(z);
        }
        let settled = streamer.total_handles();
        for _ in 0..50 {
            z += 5.0;
            streamer.update(z);
        }
        assert_eq!(streamer.total_handles(), settled);
    }

    #[test]
    fn test_safe_start_tiles_use_first_kind() {
        let streamer = WorldStreamer::new(WorldConfig::default(), 99);
        let kinds: Vec<usize> = streamer.active_window().map(|(_, t)| t.kind).take(4).collect();
        assert_eq!(kinds, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_same_seed_same_tiles() {
        let mut a = WorldStreamer::new(WorldConfig::default(), 7);
        let mut b = WorldStreamer::new(WorldConfig::default(), 7);
        for step in 0..40 {
            a.update(step as f32 * 3.0);
            b.update(step as f32 * 3.0);
        }
        let kinds_a: Vec<usize> = a.active_window().map(|(_, t)| t.kind).collect();
        let kinds_b: Vec<usize> = b.active_window().map(|(_, t)| t.kind).collect();
        assert_eq!(kinds_a, kinds_b);
        assert_eq!(a.rng_state(), b.rng_state());
    }

    #[test]
    fn test_rng_state_advances_past_safe_start() {
        let config = WorldConfig {
            prewarm_count: 4,
            safe_start_tiles: 4,
            ..WorldConfig::default()
        };
        let mut streamer = WorldStreamer::new(config, 11);
        // Safe-start tiles never draw
        assert_eq!(streamer.rng_state(), DeterministicRng::new(11).state());

        streamer.update(10.0);
        assert_ne!(streamer.rng_state(), DeterministicRng::new(11).state());
    }

    proptest! {
        #[test]
        fn prop_pool_and_window_invariants(steps in proptest::collection::vec(0.0f32..4.0, 1..200)) {
            let mut streamer = WorldStreamer::new(WorldConfig::default(), 3);
            let total = streamer.total_handles();
            let mut z = 0.0f32;

            for step in steps {
                z += step;
                streamer.update(z);

                // Disjoint and complete
                let mut seen = vec![false; streamer.total_handles()];
                for (handle, tile) in streamer.active_window() {
                    prop_assert!(tile.active);
                    prop_assert!(!seen[handle.0 as usize]);
                    seen[handle.0 as usize] = true;
                }
                for handle in streamer.pooled() {
                    prop_assert!(!streamer.tile(handle).unwrap().active);
                    prop_assert!(!seen[handle.0 as usize]);
                    seen[handle.0 as usize] = true;
                }
                prop_assert!(seen.iter().all(|s| *s));

                // Constant after warm-up
                prop_assert_eq!(streamer.pool_len() + streamer.active_len(), total);

                // Ordered window
                let coords = active_coords(&streamer);
                prop_assert!(coords.windows(2).all(|w| w[0] <= w[1]));
            }
        }
    }
}
