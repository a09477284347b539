//! Error types for the multilingual vector database
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.
//!
//! Only [`GlossaError`] crosses the public API boundary, and only for
//! configuration problems. Embedding and persistence failures are reported
//! through their own types, logged, and degraded around.

use std::path::PathBuf;

use thiserror::Error;

use crate::vector::{VectorError, VectorSlot, VectorStorageError};

/// Main error type for database operations
#[derive(Error, Debug)]
pub enum GlossaError {
    /// The model chosen for a language disagrees with that language's index
    #[error(
        "Dimension mismatch for language '{language}': index expects {expected}, model '{model}' produces {actual}"
    )]
    DimensionMismatch {
        language: String,
        model: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Invalid language code '{code}': {reason}")]
    InvalidLanguage { code: String, reason: &'static str },

    #[error("Vector slot space exhausted after {count} documents")]
    SlotExhausted { count: u32 },

    /// Two documents claimed the same slot in one language index
    #[error("Vector slot {slot} is already used in the '{language}' index")]
    SlotInUse { language: String, slot: VectorSlot },

    #[error("Vector operation failed: {0}")]
    Vector(#[from] VectorError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
}

impl GlossaError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that callers can match on without
    /// parsing messages.
    pub fn status_code(&self) -> String {
        match self {
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::InvalidConfig { .. } => "CONFIG_ERROR",
            Self::InvalidLanguage { .. } => "INVALID_LANGUAGE",
            Self::SlotExhausted { .. } => "SLOT_EXHAUSTED",
            Self::SlotInUse { .. } => "SLOT_IN_USE",
            Self::Vector(_) => "VECTOR_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::DimensionMismatch { .. } => vec![
                "Keep each language on one embedding model for the lifetime of its index",
                "Point data_path at a fresh directory after changing model dimensions",
            ],
            Self::InvalidConfig { .. } => vec![
                "Check .glossa/settings.toml and GLOSSA_* environment variables",
                "Delete the offending key to fall back to the default",
            ],
            Self::InvalidLanguage { .. } => {
                vec!["Use a short ISO 639 code such as 'fr', 'yua' or 'qu'"]
            }
            Self::SlotExhausted { .. } => {
                vec!["Split the corpus across several data directories"]
            }
            Self::SlotInUse { .. } => vec![
                "The saved snapshot may be corrupt; restore it from a backup",
                "Use VectorDatabase::open so saved state loads before new documents",
            ],
            Self::Persistence(_) => vec![
                "Check disk space and permissions in the data directory",
                "The database keeps working in memory; retry save() later",
            ],
            Self::Vector(_) => vec![],
        }
    }
}

/// Errors raised while producing an embedding.
///
/// These never reach `add_document` or `search` callers; the generator logs
/// them and substitutes a fallback vector.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding backend '{backend}' did not answer within {timeout_ms} ms")]
    BackendTimeout { backend: String, timeout_ms: u64 },

    #[error("Embedding backend '{backend}' failed: {reason}")]
    Backend { backend: String, reason: String },

    #[error("Embedding backend '{backend}' worker disconnected")]
    BackendDisconnected { backend: String },

    #[error("Embedding has dimension {actual}, model expects {expected}")]
    WrongDimension { expected: usize, actual: usize },

    #[error("Embedding contains non-finite values")]
    NonFinite,

    #[error("Embedding has zero norm")]
    ZeroNorm,
}

/// Errors from saving or loading the metadata snapshot and vector segments.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize metadata snapshot: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot format version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Vector segment error: {0}")]
    Segment(#[from] VectorStorageError),

    #[error("Metadata backend failed: {0}")]
    Backend(String),
}

/// Result type alias for database operations
pub type GlossaResult<T> = Result<T, GlossaError>;

/// Result type alias for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Result type alias for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Helper trait for attaching a path to I/O errors
pub trait IoContext<T> {
    fn with_path(self, path: &std::path::Path) -> PersistenceResult<T>;
}

impl<T> IoContext<T> for Result<T, std::io::Error> {
    fn with_path(self, path: &std::path::Path) -> PersistenceResult<T> {
        self.map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
