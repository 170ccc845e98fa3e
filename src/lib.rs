//! # Lane Runner Core
//!
//! Tick-driven simulation core for an endless lane runner.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    LANE RUNNER CORE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/              - Primitives                             │
//! │  ├── vec3.rs        - 2D/3D float vectors                    │
//! │  ├── clock.rs       - Scaled sim clock + real clock          │
//! │  ├── rng.rs         - Seeded Xorshift128+ PRNG               │
//! │  └── hash.rs        - State hashing for replay checks        │
//! │                                                              │
//! │  game/              - Simulation                             │
//! │  ├── input.rs       - Pointer samples, keys, input log       │
//! │  ├── gesture.rs     - Swipe / jump classification            │
//! │  ├── motion.rs      - Lanes, jump arc, ground snap           │
//! │  ├── collision.rs   - Mover contract + flat corridor         │
//! │  ├── world.rs       - Pooled tile streaming                  │
//! │  ├── session.rs     - Run state, speed, score, best          │
//! │  ├── store.rs       - Best-score persistence                 │
//! │  ├── presentation.rs- HUD sink                               │
//! │  ├── config.rs      - RunnerConfig                           │
//! │  ├── events.rs      - Per-tick events                        │
//! │  └── tick.rs        - Simulation (fixed step order)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reproducibility
//!
//! A run is reproducible within one build on one machine: given the same
//! config, seed and recorded [`InputLog`], [`replay_run`] reaches the same
//! state hash. Cross-machine bit-exactness is not promised.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use crate::core::vec3::{Vec2, Vec3};
pub use crate::core::rng::DeterministicRng;
pub use game::config::RunnerConfig;
pub use game::input::{InputLog, TickInput};
pub use game::tick::{replay_run, Simulation, TickResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
