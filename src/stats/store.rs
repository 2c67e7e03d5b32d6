//! JSON file persistence for the stats record.

use super::StatsState;
use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File the stats record is kept in when no path is configured.
pub const DEFAULT_STATS_PATH: &str = "soundmaster-stats.json";

/// Loads and saves one stats record at a fixed path.
#[derive(Debug, Clone)]
pub struct StatsStore {
    path: PathBuf,
}

impl StatsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored record.
    ///
    /// # Returns
    ///
    /// `None` if nothing has been saved yet. Fields missing from the file
    /// keep their default values.
    ///
    /// # Errors
    ///
    /// `Error::Persistence` if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<StatsState>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.persistence_error(e)),
        };
        let mut state: StatsState = serde_json::from_str(&json)
            .map_err(|e| self.persistence_error(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        state.fill_missing_modes();
        debug!(path = %self.path.display(), "Loaded stats");
        Ok(Some(state))
    }

    /// Writes the record as pretty-printed JSON, replacing any previous one.
    pub fn save(&self, state: &StatsState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| self.persistence_error(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        fs::write(&self.path, json).map_err(|e| self.persistence_error(e))?;
        debug!(path = %self.path.display(), "Saved stats");
        Ok(())
    }

    fn persistence_error(&self, source: io::Error) -> Error {
        Error::Persistence {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for StatsStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATS_PATH)
    }
}
