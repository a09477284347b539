//! Document metadata: the in-memory store and its durable backends.

pub mod memory;
pub mod metadata;
pub mod persistence;

pub use memory::MetadataStore;
pub use metadata::{Snapshot, SnapshotHeader};
pub use persistence::{JsonFileBackend, MetadataBackend, SNAPSHOT_FILE};
