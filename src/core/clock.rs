//! Tick Clock
//!
//! Two time sources advanced together once per tick:
//!
//! - **sim**: scaled by the session's time scale. Stops while paused or
//!   after game over. Drives speed ramp, score, jump arcs, streaming.
//! - **real**: always advances. Drives gesture windows and cooldowns.

use serde::{Serialize, Deserialize};

/// Fixed-step clock with a scaled and an unscaled timeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickClock {
    tick: u64,
    real_time: f32,
    sim_time: f32,
    sim_dt: f32,
}

impl TickClock {
    /// Create a clock at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one tick.
    ///
    /// `time_scale` is clamped to [0, 1]; 0 freezes the sim timeline.
    pub fn advance(&mut self, real_dt: f32, time_scale: f32) {
        let scale = time_scale.clamp(0.0, 1.0);
        self.tick += 1;
        self.real_time += real_dt;
        self.sim_dt = real_dt * scale;
        self.sim_time += self.sim_dt;
    }

    /// Number of ticks advanced so far.
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Unscaled seconds since creation.
    #[inline]
    pub fn real_time(&self) -> f32 {
        self.real_time
    }

    /// Scaled seconds since creation.
    #[inline]
    pub fn sim_time(&self) -> f32 {
        self.sim_time
    }

    /// Scaled duration of the last tick (0 while frozen).
    #[inline]
    pub fn sim_dt(&self) -> f32 {
        self.sim_dt
    }

    /// True if the last tick did not advance simulation time.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.sim_dt <= 0.0
    }
}
