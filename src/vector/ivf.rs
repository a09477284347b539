//! Inverted file (IVF-Flat) backend.
//!
//! Vectors are partitioned by cosine k-means into `nlist` clusters; a query
//! probes only the `nprobe` clusters whose centroids are closest and scores
//! their members exactly. Until the index holds `training_threshold`
//! vectors there are no centroids and search falls back to a full scan.

use tracing::{debug, warn};

use crate::vector::backend::{IndexKind, VectorIndex, rank_exact, vector_bytes};
use crate::vector::clustering::{assign_to_nearest_centroid, kmeans_clustering, nearest_centroids};
use crate::vector::types::{VectorDimension, VectorError, VectorSlot};

/// Minimum number of clusters for K-means clustering.
const MIN_CLUSTERS: usize = 1;

#[derive(Debug, Clone)]
pub struct IvfIndex {
    dimension: VectorDimension,
    entries: Vec<(VectorSlot, Vec<f32>)>,

    /// Unit-length centroids; empty while untrained.
    centroids: Vec<Vec<f32>>,

    /// Member positions (into `entries`) for each centroid.
    lists: Vec<Vec<usize>>,

    /// Population at the last training run.
    trained_at: usize,

    nlist: usize,
    nprobe: usize,
    training_threshold: usize,
}

impl IvfIndex {
    pub fn new(
        dimension: VectorDimension,
        nlist: usize,
        nprobe: usize,
        training_threshold: usize,
    ) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
            centroids: Vec::new(),
            lists: Vec::new(),
            trained_at: 0,
            nlist: nlist.max(MIN_CLUSTERS),
            nprobe: nprobe.max(1),
            training_threshold: training_threshold.max(1),
        }
    }

    #[must_use]
    pub fn is_trained(&self) -> bool {
        !self.centroids.is_empty()
    }

    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.centroids.len()
    }

    fn train(&mut self) -> Result<(), VectorError> {
        let n = self.entries.len();
        // sqrt(n) keeps clusters populated for small indices
        let k = ((n as f32).sqrt().ceil() as usize).clamp(MIN_CLUSTERS, self.nlist);

        let vectors: Vec<&[f32]> = self.entries.iter().map(|(_, v)| v.as_slice()).collect();
        let result = kmeans_clustering(&vectors, k)
            .map_err(|e| VectorError::ClusteringFailed(e.to_string()))?;

        let mut lists = vec![Vec::new(); result.centroids.len()];
        for (position, cluster) in result.assignments.iter().enumerate() {
            lists[cluster.index()].push(position);
        }

        debug!(
            "trained IVF over {n} vectors: {} clusters in {} iterations",
            result.centroids.len(),
            result.iterations
        );

        self.centroids = result.centroids;
        self.lists = lists;
        self.trained_at = n;
        Ok(())
    }

    fn needs_training(&self) -> bool {
        let n = self.entries.len();
        n >= self.training_threshold && (!self.is_trained() || n >= self.trained_at * 2)
    }
}

impl VectorIndex for IvfIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Ivf
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn add(&mut self, slot: VectorSlot, vector: &[f32]) -> Result<(), VectorError> {
        self.dimension.validate_vector(vector)?;
        self.entries.push((slot, vector.to_vec()));

        if self.needs_training() {
            match self.train() {
                Ok(()) => return Ok(()),
                // Keep serving from the previous partition (or a full scan)
                Err(e) => warn!("IVF training failed, keeping previous state: {e}"),
            }
        }

        if self.is_trained() {
            let centroid_refs: Vec<&[f32]> = self.centroids.iter().map(|c| c.as_slice()).collect();
            let cluster = assign_to_nearest_centroid(vector, &centroid_refs);
            self.lists[cluster.index()].push(self.entries.len() - 1);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(VectorSlot, f32)>, VectorError> {
        self.dimension.validate_vector(query)?;

        if !self.is_trained() {
            return Ok(rank_exact(
                query,
                self.entries.iter().map(|(slot, v)| (*slot, v.as_slice())),
                top_k,
            ));
        }

        let probes = nearest_centroids(query, &self.centroids, self.nprobe);
        let candidates = probes
            .iter()
            .flat_map(|cluster| self.lists[cluster.index()].iter())
            .map(|&position| {
                let (slot, vector) = &self.entries[position];
                (*slot, vector.as_slice())
            });

        Ok(rank_exact(query, candidates, top_k))
    }

    fn rebuild(&mut self) -> Result<(), VectorError> {
        if self.entries.len() >= self.training_threshold {
            self.train()
        } else {
            self.centroids.clear();
            self.lists.clear();
            self.trained_at = 0;
            Ok(())
        }
    }

    fn vectors(&self) -> Box<dyn Iterator<Item = (VectorSlot, &[f32])> + '_> {
        Box::new(self.entries.iter().map(|(slot, v)| (*slot, v.as_slice())))
    }

    fn memory_bytes(&self) -> usize {
        let centroid_bytes = self.centroids.len() * self.dimension.get() * std::mem::size_of::<f32>();
        let list_bytes = self.entries.len() * std::mem::size_of::<usize>();
        vector_bytes(self.entries.len(), self.dimension) + centroid_bytes + list_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clustered(n: usize, dim: usize) -> Vec<Vec<f32>> {
        // Four well separated directions with small per-vector jitter
        (0..n)
            .map(|i| {
                let mut v = vec![0.0; dim];
                v[i % 4] = 1.0;
                v[4 + (i % (dim - 4))] += 0.05;
                v
            })
            .collect()
    }

    #[test]
    fn test_untrained_below_threshold() {
        let mut index = IvfIndex::new(VectorDimension::new(8).unwrap(), 10, 2, 50);
        for (i, v) in clustered(20, 8).iter().enumerate() {
            index.add(VectorSlot::new(i as u32), v).unwrap();
        }
        assert!(!index.is_trained());
        assert_eq!(index.search(&clustered(1, 8)[0], 20).unwrap().len(), 20);
    }

    #[test]
    fn test_trains_at_threshold_and_retrains_on_doubling() {
        let mut index = IvfIndex::new(VectorDimension::new(8).unwrap(), 10, 2, 16);
        let data = clustered(40, 8);

        for (i, v) in data.iter().take(16).enumerate() {
            index.add(VectorSlot::new(i as u32), v).unwrap();
        }
        assert!(index.is_trained());
        assert_eq!(index.trained_at, 16);

        for (i, v) in data.iter().enumerate().skip(16).take(16) {
            index.add(VectorSlot::new(i as u32), v).unwrap();
        }
        assert_eq!(index.trained_at, 32);
        assert!(index.cluster_count() <= 10);

        let listed: usize = index.lists.iter().map(Vec::len).sum();
        assert_eq!(listed, 32);
    }

    #[test]
    fn test_trained_search_finds_self() {
        let mut index = IvfIndex::new(VectorDimension::new(8).unwrap(), 4, 1, 8);
        let data = clustered(32, 8);
        for (i, v) in data.iter().enumerate() {
            index.add(VectorSlot::new(i as u32), v).unwrap();
        }
        assert!(index.is_trained());

        for (i, v) in data.iter().enumerate() {
            let hits = index.search(v, 1).unwrap();
            assert!((hits[0].1 - 1.0).abs() < 1e-5, "vector {i} not retrieved");
        }
    }

    #[test]
    fn test_rebuild_below_threshold_clears_training() {
        let mut index = IvfIndex::new(VectorDimension::new(8).unwrap(), 4, 1, 8);
        for (i, v) in clustered(8, 8).iter().enumerate() {
            index.add(VectorSlot::new(i as u32), v).unwrap();
        }
        assert!(index.is_trained());

        index.training_threshold = 100;
        index.rebuild().unwrap();
        assert!(!index.is_trained());
        assert_eq!(index.len(), 8);
    }
}
