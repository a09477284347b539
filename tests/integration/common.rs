//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use glossa::{Settings, VectorDatabase};
use tempfile::TempDir;

/// Settings rooted in `dir`, persistence on, autosave off.
pub fn settings_in(dir: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.data_path = dir.path().join("data");
    settings.persistence.autosave_every = 0;
    settings
}

/// Settings with persistence switched off.
pub fn in_memory_settings() -> Settings {
    let mut settings = Settings::default();
    settings.persistence.enabled = false;
    settings
}

pub fn in_memory_db() -> VectorDatabase {
    VectorDatabase::new(in_memory_settings()).expect("default settings are valid")
}
