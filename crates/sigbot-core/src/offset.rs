//! Durable `getUpdates` cursor.
//!
//! Stored as a single document `{"offset": <n>}`. Reads fail open to 0 so a
//! corrupt or missing state file restarts from the latest page instead of
//! wedging the poller.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{utils::atomic_write, Result};

#[derive(Debug, Serialize, Deserialize)]
struct OffsetState {
    offset: i64,
}

#[derive(Clone, Debug)]
pub struct OffsetStore {
    path: PathBuf,
    staging_dir: PathBuf,
}

impl OffsetStore {
    pub fn new(path: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            staging_dir: staging_dir.into(),
        }
    }

    /// Last persisted offset, or 0 when absent or unreadable.
    pub fn get(&self) -> i64 {
        let Ok(txt) = std::fs::read_to_string(&self.path) else {
            return 0;
        };
        match serde_json::from_str::<OffsetState>(&txt) {
            Ok(state) => state.offset,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "offset state unreadable, starting from 0: {e}");
                0
            }
        }
    }

    /// Persist `offset` unless it equals what is already stored.
    ///
    /// Returns whether a write happened.
    pub fn set(&self, offset: i64) -> Result<bool> {
        if self.path.exists() && self.get() == offset {
            return Ok(false);
        }
        let txt = serde_json::to_string(&OffsetState { offset })?;
        atomic_write(&self.path, &self.staging_dir, txt.as_bytes())?;
        tracing::debug!(offset, "offset advanced");
        Ok(true)
    }
}
