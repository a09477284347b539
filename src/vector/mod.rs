//! Vector storage and nearest-neighbour search.
//!
//! Every language index owns one [`VectorIndex`] chosen by configuration:
//! an exact [`FlatIndex`], an [`IvfIndex`] trained with cosine k-means, or an
//! [`HnswIndex`] graph. Raw vectors are persisted as memory-mapped segment
//! files so any backend can be rebuilt from disk.

mod backend;
mod clustering;
mod flat;
mod hnsw;
mod ivf;
mod similarity;
mod storage;
mod types;

pub use backend::{IndexKind, VectorIndex, create_index};
pub use clustering::{ClusteringError, KMeansResult, kmeans_clustering};
pub use flat::FlatIndex;
pub use hnsw::HnswIndex;
pub use ivf::IvfIndex;
pub use similarity::{cosine_similarity, l2_norm, normalize, normalized};
pub use storage::{MmapVectorStorage, VectorStorageError};
pub use types::{
    ClusterId, SegmentOrdinal, VectorDimension, VectorError, VectorId, VectorSlot,
};
