//! Runner Configuration
//!
//! One serde tree holding every component's tuning. Missing fields take
//! their defaults, so a config file only needs the values it changes.

use std::path::Path;

use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::game::gesture::GestureConfig;
use crate::game::motion::MotionConfig;
use crate::game::session::SessionConfig;
use crate::game::world::WorldConfig;

/// Environment variable holding a config file path.
pub const CONFIG_ENV_VAR: &str = "LANE_RUNNER_CONFIG";

/// Configuration problem.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config text is not valid JSON for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// World catalog has no tile kinds
    #[error("tile catalog is empty")]
    EmptyCatalog,

    /// A value that must be positive is zero or negative
    #[error("{field} must be positive, got {value}")]
    NonPositive {
        /// Offending field
        field: &'static str,
        /// Value found
        value: f32,
    },

    /// A value that may be zero is negative
    #[error("{field} must not be negative, got {value}")]
    Negative {
        /// Offending field
        field: &'static str,
        /// Value found
        value: f32,
    },

    /// Tick rate of zero
    #[error("tick rate must be positive")]
    ZeroTickRate,
}

/// Complete runner configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Base seed for world generation
    pub seed: u64,
    /// Gesture classification
    pub gesture: GestureConfig,
    /// Lane and jump motion
    pub motion: MotionConfig,
    /// Tile streaming
    pub world: WorldConfig,
    /// Run state and scoring
    pub session: SessionConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            seed: 0x5EED_0001,
            gesture: GestureConfig::default(),
            motion: MotionConfig::default(),
            world: WorldConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Parse from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        info!(path = %path.as_ref().display(), "Loaded config");
        Ok(config)
    }

    /// Load from the file named by `LANE_RUNNER_CONFIG`, or use defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Fixed tick duration in seconds.
    #[inline]
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Collect configuration problems.
    ///
    /// Nothing here is fatal; affected components degrade on their own.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut issues = Vec::new();

        if self.tick_rate == 0 {
            issues.push(ConfigError::ZeroTickRate);
        }
        if self.world.catalog.is_empty() {
            issues.push(ConfigError::EmptyCatalog);
        }

        let positive = [
            ("motion.gravity", self.motion.gravity),
            ("motion.jump_height", self.motion.jump_height),
            ("motion.lane_offset", self.motion.lane_offset),
            ("world.tile_length", self.world.tile_length),
            ("gesture.max_swipe_duration", self.gesture.max_swipe_duration),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                issues.push(ConfigError::NonPositive { field, value });
            }
        }

        let non_negative = [
            ("motion.coyote_time", self.motion.coyote_time),
            ("motion.jump_buffer", self.motion.jump_buffer),
            ("gesture.command_cooldown", self.gesture.command_cooldown),
            ("session.speed_ramp_per_sec", self.session.speed_ramp_per_sec),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                issues.push(ConfigError::Negative { field, value });
            }
        }

        issues
    }

    /// Log every validation issue.
    pub fn report_issues(&self) -> usize {
        let issues = self.validate();
        for issue in &issues {
            warn!("Config issue: {}", issue);
        }
        issues.len()
    }
}
