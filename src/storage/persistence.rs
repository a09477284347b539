//! Durable metadata collaborators.
//!
//! The database only touches a backend at its boundaries: `load` when it
//! opens and `save` on flush, autosave and close.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::metadata::Snapshot;
use crate::error::{IoContext, PersistenceResult};

/// File name of the JSON metadata snapshot.
pub const SNAPSHOT_FILE: &str = "snapshot.json";

/// Stores and retrieves the serialized document map.
pub trait MetadataBackend: Send + Sync {
    fn name(&self) -> &str;

    fn save(&self, snapshot: &Snapshot) -> PersistenceResult<()>;

    /// Returns `None` when nothing was saved yet.
    fn load(&self) -> PersistenceResult<Option<Snapshot>>;
}

/// Writes `snapshot.json` into a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    base_path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.base_path.join(SNAPSHOT_FILE)
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path().exists()
    }
}

impl MetadataBackend for JsonFileBackend {
    fn name(&self) -> &str {
        "json-file"
    }

    fn save(&self, snapshot: &Snapshot) -> PersistenceResult<()> {
        fs::create_dir_all(&self.base_path).with_path(&self.base_path)?;

        let path = self.snapshot_path();
        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(snapshot)?;

        // Readers only ever see a complete snapshot
        fs::write(&temp_path, json).with_path(&temp_path)?;
        fs::rename(&temp_path, &path).with_path(&path)?;

        debug!(path = %path.display(), documents = snapshot.documents.len(), "metadata snapshot written");
        Ok(())
    }

    fn load(&self) -> PersistenceResult<Option<Snapshot>> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read(&path).with_path(&path)?;
        let snapshot: Snapshot = serde_json::from_slice(&json)?;
        snapshot.header.check_version()?;
        Ok(Some(snapshot))
    }
}
