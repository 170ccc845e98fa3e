//! Game Logic Module
//!
//! All runner simulation code.
//!
//! ## Module Structure
//!
//! - `input`: Pointer samples, fallback keys, host commands, input log
//! - `gesture`: Gesture classification
//! - `motion`: Lane changes, jump arc, ground snap
//! - `collision`: Character mover contract and reference corridor
//! - `world`: Tile pool and active window
//! - `session`: Run state machine, speed ramp, score, best score
//! - `store`: Best-score persistence
//! - `presentation`: HUD value updates
//! - `config`: Configuration tree
//! - `events`: Per-tick events
//! - `tick`: The simulation loop

pub mod input;
pub mod gesture;
pub mod motion;
pub mod collision;
pub mod world;
pub mod session;
pub mod store;
pub mod presentation;
pub mod config;
pub mod events;
pub mod tick;

// Re-export key types
pub use input::{HostCommand, InputLog, KeyCommand, PointerSample, TickInput};
pub use gesture::{GestureClassifier, GestureCommand, LaneDirection};
pub use motion::{MotionController, MotionOutput};
pub use collision::{CharacterMover, FlatCorridor};
pub use world::{TileHandle, WorldStreamer};
pub use session::{RunState, SessionStateMachine};
pub use store::{BestScoreStore, JsonFileStore, MemoryStore};
pub use events::{SimEvent, SimEventData};
pub use tick::TickResult;
