//! HNSW graph backend built on `rust-cv/hnsw`.
//!
//! The graph only proposes candidates; hits are rescored with exact cosine
//! similarity against the stored vectors so scores match the other backends.

use hnsw::{Hnsw, Searcher};
use rand_pcg::Pcg64;
use space::{Metric, Neighbor};

use crate::vector::backend::{IndexKind, VectorIndex, rank_exact, vector_bytes};
use crate::vector::similarity::cosine_similarity;
use crate::vector::types::{VectorDimension, VectorError, VectorSlot};

/// Floor for the query-time candidate list size.
const MIN_EF_SEARCH: usize = 50;

/// Scale mapping cosine distance in `[0, 2]` onto `u32`.
const DISTANCE_SCALE: f32 = u32::MAX as f32 / 2.0;

/// Cosine distance (`1 - similarity`) quantized to `u32`.
struct CosineDistance;

impl Metric<Box<[f32]>> for CosineDistance {
    type Unit = u32;

    fn distance(&self, a: &Box<[f32]>, b: &Box<[f32]>) -> u32 {
        let (a, b): (&[f32], &[f32]) = (a, b);
        if a.iter().all(|&x| x == 0.0) || b.iter().all(|&x| x == 0.0) {
            return u32::MAX;
        }
        let distance = 1.0 - cosine_similarity(a, b);
        (distance * DISTANCE_SCALE) as u32
    }
}

/// Graph parameters: M = 16 links per node, M0 = 32 at layer 0.
type Graph = Hnsw<CosineDistance, Box<[f32]>, Pcg64, 16, 32>;

pub struct HnswIndex {
    dimension: VectorDimension,
    graph: Graph,
    /// Graph item position -> slot.
    slots: Vec<VectorSlot>,
    /// Raw vectors in graph order, kept for rescoring and persistence.
    vectors: Vec<Box<[f32]>>,
    ef_search: usize,
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("dimension", &self.dimension)
            .field("len", &self.slots.len())
            .field("ef_search", &self.ef_search)
            .finish()
    }
}

impl HnswIndex {
    pub fn new(dimension: VectorDimension, ef_search: usize) -> Self {
        Self {
            dimension,
            graph: Hnsw::new(CosineDistance),
            slots: Vec::new(),
            vectors: Vec::new(),
            ef_search: ef_search.max(1),
        }
    }

    fn insert_into_graph(graph: &mut Graph, vector: Box<[f32]>) {
        let mut searcher = Searcher::default();
        graph.insert(vector, &mut searcher);
    }
}

impl VectorIndex for HnswIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Hnsw
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn add(&mut self, slot: VectorSlot, vector: &[f32]) -> Result<(), VectorError> {
        self.dimension.validate_vector(vector)?;
        let boxed: Box<[f32]> = vector.into();
        Self::insert_into_graph(&mut self.graph, boxed.clone());
        self.slots.push(slot);
        self.vectors.push(boxed);
        Ok(())
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(VectorSlot, f32)>, VectorError> {
        self.dimension.validate_vector(query)?;

        if self.slots.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let ef = (top_k * 2).max(self.ef_search).max(MIN_EF_SEARCH);
        // Pull the whole candidate list and let exact rescoring pick top_k
        let wanted = ef.min(self.slots.len());
        let mut neighbors = vec![
            Neighbor {
                index: !0,
                distance: !0
            };
            wanted
        ];
        let query_box: Box<[f32]> = query.into();

        // Searcher holds per-query scratch space; a fresh one keeps search on &self
        let mut searcher = Searcher::default();
        let found = self
            .graph
            .nearest(&query_box, ef, &mut searcher, &mut neighbors);

        let candidates = found
            .iter()
            .filter(|n| n.index != !0 && n.index < self.slots.len())
            .map(|n| (self.slots[n.index], &*self.vectors[n.index]));

        Ok(rank_exact(query, candidates, top_k))
    }

    fn rebuild(&mut self) -> Result<(), VectorError> {
        let mut graph = Hnsw::new(CosineDistance);
        for vector in &self.vectors {
            Self::insert_into_graph(&mut graph, vector.clone());
        }
        self.graph = graph;
        Ok(())
    }

    fn vectors(&self) -> Box<dyn Iterator<Item = (VectorSlot, &[f32])> + '_> {
        Box::new(
            self.slots
                .iter()
                .zip(self.vectors.iter())
                .map(|(slot, v)| (*slot, &**v)),
        )
    }

    fn memory_bytes(&self) -> usize {
        // Graph stores its own copy plus roughly M0 links per node
        let graph_links = self.slots.len() * 32 * std::mem::size_of::<usize>();
        2 * vector_bytes(self.slots.len(), self.dimension) + graph_links
    }
}
