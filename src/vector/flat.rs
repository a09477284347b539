//! Exact linear-scan backend.

use crate::vector::backend::{IndexKind, VectorIndex, rank_exact, vector_bytes};
use crate::vector::types::{VectorDimension, VectorError, VectorSlot};

/// Brute-force cosine scan over every stored vector.
///
/// Search cost is O(n · d); recall is always exact.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: VectorDimension,
    entries: Vec<(VectorSlot, Vec<f32>)>,
}

impl FlatIndex {
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }
}

impl VectorIndex for FlatIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Flat
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
        Ok(())
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(VectorSlot, f32)>, VectorError> {
        self.dimension.validate_vector(query)?;
        Ok(rank_exact(
            query,
            self.entries.iter().map(|(slot, v)| (*slot, v.as_slice())),
            top_k,
        ))
    }

    fn rebuild(&mut self) -> Result<(), VectorError> {
        Ok(())
    }

    fn vectors(&self) -> Box<dyn Iterator<Item = (VectorSlot, &[f32])> + '_> {
        Box::new(self.entries.iter().map(|(slot, v)| (*slot, v.as_slice())))
    }

    fn memory_bytes(&self) -> usize {
        vector_bytes(self.entries.len(), self.dimension)
    }
}
