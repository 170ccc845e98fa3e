//! Core primitives.
//!
//! Vectors, the dual tick clock, seeded randomness and state hashing.
//! Nothing here knows about lanes, tiles or sessions.

pub mod vec3;
pub mod clock;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec3::{Vec2, Vec3};
pub use clock::TickClock;
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
