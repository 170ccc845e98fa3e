//! Best-Score Persistence
//!
//! The core reads the persisted best once at startup and writes it back at
//! game-over and on an explicit clear. Values are named floats.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Store failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("store I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Backing file could not be parsed or written as JSON
    #[error("store file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value store for named float values.
pub trait BestScoreStore {
    /// Read a value; missing keys read as 0.
    fn get(&self, key: &str) -> f32;

    /// Write a value (not durable until `flush`).
    fn set(&mut self, key: &str, value: f32);

    /// Make pending writes durable.
    fn flush(&mut self) -> Result<(), StoreError>;
}

/// In-memory store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, f32>,
    flushes: u32,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one value.
    pub fn with_value(key: &str, value: f32) -> Self {
        let mut store = Self::new();
        store.values.insert(key.to_string(), value);
        store
    }

    /// Number of flushes so far.
    pub fn flushes(&self) -> u32 {
        self.flushes
    }
}

impl BestScoreStore for MemoryStore {
    fn get(&self, key: &str) -> f32 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    fn set(&mut self, key: &str, value: f32) {
        self.values.insert(key.to_string(), value);
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.flushes += 1;
        Ok(())
    }
}

/// Store backed by a flat JSON object on disk.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, f32>,
    dirty: bool,
}

impl JsonFileStore {
    /// Open a store; a missing file reads as empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        debug!(path = %path.display(), entries = values.len(), "Opened score store");
        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BestScoreStore for JsonFileStore {
    fn get(&self, key: &str) -> f32 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    fn set(&mut self, key: &str, value: f32) {
        self.values.insert(key.to_string(), value);
        self.dirty = true;
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, text)?;
        self.dirty = false;
        Ok(())
    }
}
