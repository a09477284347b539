//! The pluggable ANN backend seam.
//!
//! A language index stores its vectors in exactly one [`VectorIndex`]. The
//! search engine only ever talks to the trait, so an exact scan, an inverted
//! file index and an HNSW graph are interchangeable by configuration.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::IndexConfig;
use crate::vector::flat::FlatIndex;
use crate::vector::hnsw::HnswIndex;
use crate::vector::ivf::IvfIndex;
use crate::vector::similarity::cosine_similarity;
use crate::vector::storage::{MmapVectorStorage, VectorStorageError};
use crate::vector::types::{SegmentOrdinal, VectorDimension, VectorError, VectorSlot};

/// Which ANN structure backs a language index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Exact linear scan.
    #[default]
    Flat,
    /// Inverted file index over k-means centroids.
    Ivf,
    /// Hierarchical navigable small world graph.
    Hnsw,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Flat => "flat",
            IndexKind::Ivf => "ivf",
            IndexKind::Hnsw => "hnsw",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(IndexKind::Flat),
            "ivf" => Ok(IndexKind::Ivf),
            "hnsw" => Ok(IndexKind::Hnsw),
            other => Err(format!("unknown index kind '{other}' (expected flat, ivf or hnsw)")),
        }
    }
}

/// Nearest-neighbour structure over the vectors of one language.
///
/// Implementations must:
/// - reject vectors whose length differs from [`dimension`](Self::dimension)
/// - return search hits sorted by descending cosine similarity
/// - report exact cosine scores, even when candidate selection is approximate
pub trait VectorIndex: Send + Sync {
    fn kind(&self) -> IndexKind;

    fn dimension(&self) -> VectorDimension;

    /// Number of vectors stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `vector` under `slot`.
    fn add(&mut self, slot: VectorSlot, vector: &[f32]) -> Result<(), VectorError>;

    /// Returns up to `top_k` `(slot, similarity)` pairs, best first.
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(VectorSlot, f32)>, VectorError>;

    /// Rebuilds derived structures (centroids, graph) from the stored vectors.
    fn rebuild(&mut self) -> Result<(), VectorError>;

    /// Iterates over every stored `(slot, vector)` pair.
    fn vectors(&self) -> Box<dyn Iterator<Item = (VectorSlot, &[f32])> + '_>;

    /// Approximate heap footprint in bytes.
    fn memory_bytes(&self) -> usize;

    /// Writes the raw vectors into `dir` as a segment file.
    fn save(&self, dir: &Path) -> Result<(), VectorStorageError> {
        let records: Vec<(VectorSlot, &[f32])> = self.vectors().collect();
        MmapVectorStorage::write_segment(dir, SegmentOrdinal::new(0), self.dimension(), &records)?;
        Ok(())
    }

    /// Re-inserts vectors previously written by [`save`](Self::save).
    ///
    /// Returns the number of vectors loaded; a missing segment loads zero.
    fn load(&mut self, dir: &Path) -> Result<usize, VectorStorageError> {
        let segment = SegmentOrdinal::new(0);
        if !MmapVectorStorage::exists(dir, segment) {
            return Ok(0);
        }

        let mut storage = MmapVectorStorage::open(dir, segment)?;
        if storage.dimension() != self.dimension() {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension().get(),
                actual: storage.dimension().get(),
            }
            .into());
        }

        let vectors = storage.read_all_vectors()?;
        let count = vectors.len();
        for (slot, vector) in vectors {
            self.add(slot, &vector)?;
        }
        self.rebuild()?;
        Ok(count)
    }
}

/// Creates an empty backend of the configured kind.
pub fn create_index(
    kind: IndexKind,
    dimension: VectorDimension,
    config: &IndexConfig,
) -> Box<dyn VectorIndex> {
    match kind {
        IndexKind::Flat => Box::new(FlatIndex::new(dimension)),
        IndexKind::Ivf => Box::new(IvfIndex::new(
            dimension,
            config.nlist,
            config.nprobe,
            config.training_threshold,
        )),
        IndexKind::Hnsw => Box::new(HnswIndex::new(dimension, config.ef_search)),
    }
}

/// Scores `candidates` exactly and keeps the best `top_k`.
///
/// Ties are broken by slot so results are stable across runs.
pub(crate) fn rank_exact<'a>(
    query: &[f32],
    candidates: impl Iterator<Item = (VectorSlot, &'a [f32])>,
    top_k: usize,
) -> Vec<(VectorSlot, f32)> {
    let mut scored: Vec<(VectorSlot, f32)> = candidates
        .map(|(slot, vector)| (slot, cosine_similarity(query, vector)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scored.truncate(top_k);
    scored
}

/// Bytes taken by `count` vectors of `dimension` floats plus their slot.
pub(crate) fn vector_bytes(count: usize, dimension: VectorDimension) -> usize {
    count * (dimension.get() * std::mem::size_of::<f32>() + std::mem::size_of::<VectorSlot>())
}
