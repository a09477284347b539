use crate::types::{DocId, Document};
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory map from document id to the full record, shared by every
/// language index for lookup, enrichment and persistence.
#[derive(Clone, Debug, Default)]
pub struct MetadataStore {
    documents: Arc<DashMap<DocId, Arc<Document>>>,
    by_language: Arc<DashMap<String, Vec<DocId>>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, document: Arc<Document>) -> DocId {
        let id = document.id.clone();
        let language = document.language.clone();

        if self.documents.insert(id.clone(), document).is_none() {
            self.by_language.entry(language).or_default().push(id.clone());
        }

        id
    }

    pub fn insert_batch(&self, documents: impl IntoIterator<Item = Arc<Document>>) {
        for document in documents {
            self.insert(document);
        }
    }

    pub fn get(&self, id: &DocId) -> Option<Arc<Document>> {
        self.documents.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: &DocId) -> bool {
        self.documents.contains_key(id)
    }

    pub fn find_by_language(&self, language: &str) -> Vec<Arc<Document>> {
        self.by_language
            .get(language)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    /// Every document, ordered by vector slot.
    pub fn documents(&self) -> Vec<Arc<Document>> {
        let mut documents: Vec<_> = self
            .documents
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        documents.sort_by_key(|d| d.vector_slot);
        documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn clear(&self) {
        self.documents.clear();
        self.by_language.clear();
    }

    /// Rough heap footprint: text, metadata JSON and embedding per document.
    pub fn memory_bytes(&self) -> usize {
        self.documents
            .iter()
            .map(|entry| {
                let doc = entry.value();
                let metadata = serde_json::to_vec(&doc.metadata)
                    .map(|json| json.len())
                    .unwrap_or_default();
                doc.text.len()
                    + doc.language.len()
                    + doc.id.as_str().len()
                    + metadata
                    + doc.embedding.len() * std::mem::size_of::<f32>()
            })
            .sum()
    }
}
