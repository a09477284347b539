//! Multilingual semantic vector index with per-language embeddings and
//! cross-lingual retrieval, aimed at low-resource languages.

pub mod config;
pub mod database;
pub mod embedding;
pub mod error;
pub mod features;
pub mod index;
pub mod logging;
pub mod search;
pub mod stats;
pub mod storage;
pub mod types;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use database::{VectorDatabase, VectorDatabaseBuilder};
pub use embedding::{Embedding, EmbeddingBackend, EmbeddingModel, EmbeddingSource, ModelRegistry};
pub use error::{
    EmbeddingError, EmbeddingResult, GlossaError, GlossaResult, PersistenceError,
    PersistenceResult,
};
pub use features::{CulturalContext, FeatureExtractor, FeatureRegistry, FeatureSet, PhoneticProfile};
pub use index::{IndexRegistry, LanguageIndex};
pub use stats::{MemoryUsage, StatsSnapshot};
pub use storage::{JsonFileBackend, MetadataBackend, Snapshot, SnapshotHeader};
pub use types::{DocId, Document, Metadata, SearchOptions, SearchResult, calculate_hash};
pub use vector::{IndexKind, VectorIndex, cosine_similarity, normalize};
