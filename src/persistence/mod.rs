//! Save/load of game progress
//!
//! A save is the score, the wave being played and which energy cells have
//! been stolen. Stores are pluggable: an in-memory store for tests and
//! embedding, and a JSON file store for the native binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Snapshot of game progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    pub score: u64,
    /// Wave being played when the save was taken (restored as-is)
    pub wave: u32,
    /// Slots of stolen energy cells
    pub stolen_resource_indices: Vec<usize>,
}

impl SaveData {
    /// Reject saves that cannot describe a live game with `resource_count` cells
    pub fn validate(&self, resource_count: usize) -> Result<()> {
        if self.wave == 0 {
            return Err(Error::InvalidSave {
                reason: "wave must be at least 1".into(),
            });
        }
        if let Some(bad) = self
            .stolen_resource_indices
            .iter()
            .find(|&&i| i >= resource_count)
        {
            return Err(Error::InvalidSave {
                reason: format!("resource index {bad} out of range (have {resource_count})"),
            });
        }
        let mut unique = self.stolen_resource_indices.clone();
        unique.sort_unstable();
        unique.dedup();
        if unique.len() >= resource_count {
            return Err(Error::InvalidSave {
                reason: "every resource is stolen".into(),
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Somewhere a save can live
pub trait SaveStore {
    fn save(&mut self, data: &SaveData) -> Result<()>;
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<SaveData>>;
    fn clear(&mut self) -> Result<()>;
}

/// Keeps the save in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Option<String>,
}

impl SaveStore for MemoryStore {
    fn save(&mut self, data: &SaveData) -> Result<()> {
        self.slot = Some(data.to_json()?);
        Ok(())
    }

    fn load(&self) -> Result<Option<SaveData>> {
        self.slot.as_deref().map(SaveData::from_json).transpose()
    }

    fn clear(&mut self) -> Result<()> {
        self.slot = None;
        Ok(())
    }
}

/// Writes the save as JSON to a file (via a temp file, then rename)
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStore for JsonFileStore {
    fn save(&mut self, data: &SaveData) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, data.to_json()?)?;
        std::fs::rename(&tmp, &self.path)?;
        log::info!("Saved wave {} to {}", data.wave, self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Option<SaveData>> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => SaveData::from_json(&json).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
