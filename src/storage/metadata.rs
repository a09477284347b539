//! Snapshot format written by the durable metadata backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, PersistenceResult};
use crate::types::Document;
use crate::vector::IndexKind;

/// Header describing a metadata snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Version of the snapshot format
    pub version: u32,

    /// Number of documents in the snapshot
    pub document_count: usize,

    /// Backend the indices were built with
    pub index_kind: IndexKind,

    /// Next vector slot to hand out after loading
    pub next_slot: u32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl SnapshotHeader {
    /// Current snapshot format version
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(index_kind: IndexKind, document_count: usize, next_slot: u32) -> Self {
        let now = Utc::now();
        Self {
            version: Self::CURRENT_VERSION,
            document_count,
            index_kind,
            next_slot,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refreshes counts and the update timestamp, keeping `created_at`.
    pub fn update(&mut self, document_count: usize, next_slot: u32) {
        self.document_count = document_count;
        self.next_slot = next_slot;
        self.updated_at = Utc::now();
    }

    /// Rejects snapshots written by a newer format.
    pub fn check_version(&self) -> PersistenceResult<()> {
        if self.version > Self::CURRENT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: self.version,
                supported: Self::CURRENT_VERSION,
            });
        }
        Ok(())
    }
}

/// Every document plus the header, as handed to a [`MetadataBackend`](super::MetadataBackend).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub header: SnapshotHeader,
    pub documents: Vec<Document>,
}
