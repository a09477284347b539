//! One language's documents and their ANN backend.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::IndexConfig;
use crate::error::{GlossaError, GlossaResult};
use crate::types::{DocId, Document};
use crate::vector::{
    IndexKind, VectorDimension, VectorIndex, VectorSlot, VectorStorageError, create_index,
};

/// Append-only store for a single language.
///
/// Every document shares the index dimension, which is fixed at creation.
pub struct LanguageIndex {
    language: String,
    dimension: VectorDimension,
    backend: Box<dyn VectorIndex>,
    documents: HashMap<VectorSlot, Arc<Document>>,
    slots: HashMap<DocId, VectorSlot>,
}

impl std::fmt::Debug for LanguageIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageIndex")
            .field("language", &self.language)
            .field("dimension", &self.dimension)
            .field("kind", &self.backend.kind())
            .field("documents", &self.documents.len())
            .finish()
    }
}

impl LanguageIndex {
    pub fn new(
        language: impl Into<String>,
        dimension: VectorDimension,
        kind: IndexKind,
        config: &IndexConfig,
    ) -> Self {
        Self {
            language: language.into(),
            dimension,
            backend: create_index(kind, dimension, config),
            documents: HashMap::new(),
            slots: HashMap::new(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    pub fn kind(&self) -> IndexKind {
        self.backend.kind()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Adds a document whose embedding is already computed.
    ///
    /// Fails when the embedding length disagrees with the index or the slot
    /// is already taken; the index is left untouched in both cases.
    pub fn insert(&mut self, document: Document) -> GlossaResult<Arc<Document>> {
        self.check(&document)?;
        self.backend.add(document.vector_slot, &document.embedding)?;
        Ok(self.track(document))
    }

    fn check(&self, document: &Document) -> GlossaResult<()> {
        if document.embedding.len() != self.dimension.get() {
            return Err(GlossaError::DimensionMismatch {
                language: self.language.clone(),
                model: document.model.clone(),
                expected: self.dimension.get(),
                actual: document.embedding.len(),
            });
        }
        if self.documents.contains_key(&document.vector_slot) {
            return Err(GlossaError::SlotInUse {
                language: self.language.clone(),
                slot: document.vector_slot,
            });
        }
        Ok(())
    }

    fn track(&mut self, document: Document) -> Arc<Document> {
        let document = Arc::new(document);
        self.slots.insert(document.id.clone(), document.vector_slot);
        self.documents
            .insert(document.vector_slot, Arc::clone(&document));
        document
    }

    pub fn contains_slot(&self, slot: VectorSlot) -> bool {
        self.documents.contains_key(&slot)
    }

    pub fn get(&self, id: &DocId) -> Option<Arc<Document>> {
        self.slots
            .get(id)
            .and_then(|slot| self.documents.get(slot))
            .cloned()
    }

    /// Documents ordered by slot, which is insertion order.
    pub fn documents(&self) -> Vec<Arc<Document>> {
        let mut documents: Vec<_> = self.documents.values().cloned().collect();
        documents.sort_by_key(|d| d.vector_slot);
        documents
    }

    /// Up to `top_k` documents with similarity at or above `threshold`, best
    /// first.
    ///
    /// A query of the wrong dimension, or a backend failure, yields no hits.
    pub fn search(&self, query: &[f32], top_k: usize, threshold: f32) -> Vec<(Arc<Document>, f32)> {
        if top_k == 0 || self.is_empty() {
            return Vec::new();
        }
        if query.len() != self.dimension.get() {
            debug!(
                language = %self.language,
                expected = self.dimension.get(),
                actual = query.len(),
                "skipping index with different dimension"
            );
            return Vec::new();
        }

        match self.backend.search(query, top_k) {
            Ok(hits) => hits
                .into_iter()
                .filter(|(_, similarity)| *similarity >= threshold)
                .filter_map(|(slot, similarity)| {
                    self.documents.get(&slot).map(|d| (Arc::clone(d), similarity))
                })
                .collect(),
            Err(e) => {
                warn!(language = %self.language, error = %e, "index search failed");
                Vec::new()
            }
        }
    }

    /// Rebuilds the backend's derived structures.
    pub fn optimize(&mut self) -> GlossaResult<()> {
        self.backend.rebuild()?;
        Ok(())
    }

    pub fn memory_bytes(&self) -> usize {
        self.backend.memory_bytes()
    }

    /// Writes the backend vectors into `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), VectorStorageError> {
        self.backend.save(dir)
    }

    /// Rebuilds an index from persisted documents.
    ///
    /// Vectors come from the segment in `dir` when it holds exactly the
    /// documents' slots; otherwise they are re-added from the embeddings.
    pub fn restore(
        language: impl Into<String>,
        dimension: VectorDimension,
        kind: IndexKind,
        config: &IndexConfig,
        documents: Vec<Document>,
        dir: Option<&Path>,
    ) -> GlossaResult<Self> {
        let mut index = Self::new(language, dimension, kind, config);
        let expected: HashSet<VectorSlot> = documents.iter().map(|d| d.vector_slot).collect();

        let from_segment = match dir {
            Some(dir) => match index.backend.load(dir) {
                Ok(_) => {
                    let loaded: HashSet<VectorSlot> =
                        index.backend.vectors().map(|(slot, _)| slot).collect();
                    loaded == expected
                }
                Err(e) => {
                    warn!(language = %index.language, error = %e, "vector segment unreadable, re-adding embeddings");
                    false
                }
            },
            None => false,
        };

        if !from_segment {
            index.backend = create_index(kind, dimension, config);
        }

        for document in documents {
            index.check(&document)?;
            if !from_segment {
                index.backend.add(document.vector_slot, &document.embedding)?;
            }
            index.track(document);
        }

        if !from_segment {
            index.backend.rebuild()?;
        }
        debug!(language = %index.language, documents = index.len(), from_segment, "language index restored");
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{CulturalContext, PhoneticProfile};
    use crate::types::Metadata;
    use crate::vector::normalized;
    use chrono::Utc;
    use tempfile::TempDir;

    fn dim(n: usize) -> VectorDimension {
        VectorDimension::new(n).unwrap()
    }

    fn doc(slot: u32, embedding: Vec<f32>) -> Document {
        Document {
            id: DocId::new(format!("{slot:016x}")),
            text: format!("doc {slot}"),
            language: "yua".to_string(),
            embedding: normalized(&embedding),
            metadata: Metadata::new(),
            added_at: Utc::now(),
            vector_slot: VectorSlot::new(slot),
            model: "test".to_string(),
            cultural_context: CulturalContext::default(),
            phonetic_profile: PhoneticProfile::default(),
        }
    }

    fn index() -> LanguageIndex {
        LanguageIndex::new("yua", dim(3), IndexKind::Flat, &IndexConfig::default())
    }

    #[test]
    fn test_insert_and_get() {
        let mut index = index();
        let stored = index.insert(doc(0, vec![1.0, 0.0, 0.0])).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&stored.id).unwrap().text, "doc 0");
        assert!(index.get(&DocId::from("missing")).is_none());
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let mut index = index();
        let err = index.insert(doc(0, vec![1.0, 0.0])).unwrap_err();
        assert!(matches!(
            err,
            GlossaError::DimensionMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
        assert!(index.is_empty());
    }

    #[test]
    fn test_taken_slot_is_rejected() {
        let mut index = index();
        let first = index.insert(doc(0, vec![1.0, 0.0, 0.0])).unwrap();

        let mut other = doc(0, vec![0.0, 1.0, 0.0]);
        other.id = DocId::from("other");
        let err = index.insert(other).unwrap_err();
        assert_eq!(err.status_code(), "SLOT_IN_USE");

        // The first document is still the only hit
        assert_eq!(index.len(), 1);
        let hits = index.search(&[0.0, 1.0, 0.0], 5, -1.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.id, first.id);
    }

    #[test]
    fn test_search_applies_threshold_and_order() {
        let mut index = index();
        index.insert(doc(0, vec![1.0, 0.0, 0.0])).unwrap();
        index.insert(doc(1, vec![1.0, 1.0, 0.0])).unwrap();
        index.insert(doc(2, vec![0.0, 0.0, 1.0])).unwrap();

        let hits = index.search(&[1.0, 0.0, 0.0], 5, 0.5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.vector_slot, VectorSlot::new(0));
        assert!(hits[0].1 >= hits[1].1);

        assert_eq!(index.search(&[1.0, 0.0, 0.0], 1, 0.0).len(), 1);
        assert!(index.search(&[1.0, 0.0], 5, 0.0).is_empty());
    }

    #[test]
    fn test_restore_from_segment_and_from_embeddings() {
        let temp_dir = TempDir::new().unwrap();
        let mut original = index();
        original.insert(doc(4, vec![1.0, 0.0, 0.0])).unwrap();
        original.insert(doc(9, vec![0.0, 1.0, 0.0])).unwrap();
        original.save(temp_dir.path()).unwrap();

        let documents = || vec![doc(4, vec![1.0, 0.0, 0.0]), doc(9, vec![0.0, 1.0, 0.0])];
        let config = IndexConfig::default();

        let restored = LanguageIndex::restore(
            "yua",
            dim(3),
            IndexKind::Flat,
            &config,
            documents(),
            Some(temp_dir.path()),
        )
        .unwrap();
        assert_eq!(restored.len(), 2);
        let hits = restored.search(&[0.0, 1.0, 0.0], 1, 0.9);
        assert_eq!(hits[0].0.vector_slot, VectorSlot::new(9));

        // A segment that does not match the documents is ignored
        let mut extra = documents();
        extra.push(doc(11, vec![0.0, 0.0, 1.0]));
        let restored = LanguageIndex::restore(
            "yua",
            dim(3),
            IndexKind::Hnsw,
            &config,
            extra,
            Some(temp_dir.path()),
        )
        .unwrap();
        assert_eq!(restored.len(), 3);
        assert_eq!(restored.search(&[0.0, 0.0, 1.0], 1, 0.9).len(), 1);
    }

    #[test]
    fn test_documents_sorted_by_slot() {
        let mut index = index();
        index.insert(doc(7, vec![1.0, 0.0, 0.0])).unwrap();
        index.insert(doc(2, vec![0.0, 1.0, 0.0])).unwrap();
        let slots: Vec<u32> = index.documents().iter().map(|d| d.vector_slot.get()).collect();
        assert_eq!(slots, vec![2, 7]);
    }
}
