//! Injected embedding and metadata backends.

use std::sync::Arc;

use glossa::{
    EmbeddingBackend, EmbeddingError, EmbeddingModel, EmbeddingResult, EmbeddingSource, IndexKind,
    Metadata, MetadataBackend, PersistenceResult, SearchOptions, Snapshot, VectorDatabase,
};
use parking_lot::Mutex;
use tempfile::TempDir;

use crate::common::{in_memory_settings, settings_in};

/// Keeps the last snapshot in memory.
#[derive(Default)]
struct MemoryBackend {
    snapshot: Mutex<Option<Snapshot>>,
}

impl MetadataBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn save(&self, snapshot: &Snapshot) -> PersistenceResult<()> {
        *self.snapshot.lock() = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> PersistenceResult<Option<Snapshot>> {
        Ok(self.snapshot.lock().clone())
    }
}

/// Embeds every text on the first axis.
struct AxisBackend;

impl EmbeddingBackend for AxisBackend {
    fn name(&self) -> &str {
        "axis"
    }

    fn infer(&self, _text: &str, _language: &str, model: &EmbeddingModel) -> EmbeddingResult<Vec<f32>> {
        let mut vector = vec![0.0; model.dimension.get()];
        vector[0] = 2.0;
        Ok(vector)
    }
}

struct FailingBackend;

impl EmbeddingBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    fn infer(&self, _text: &str, _language: &str, _model: &EmbeddingModel) -> EmbeddingResult<Vec<f32>> {
        Err(EmbeddingError::Backend {
            backend: "failing".to_string(),
            reason: "model not loaded".to_string(),
        })
    }
}

struct NanBackend;

impl EmbeddingBackend for NanBackend {
    fn name(&self) -> &str {
        "nan"
    }

    fn infer(&self, _text: &str, _language: &str, model: &EmbeddingModel) -> EmbeddingResult<Vec<f32>> {
        Ok(vec![f32::NAN; model.dimension.get()])
    }
}

#[test]
fn test_metadata_backend_shared_between_databases() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(MemoryBackend::default());

    let first = VectorDatabase::builder(settings_in(&temp_dir))
        .metadata_backend(backend.clone())
        .build()
        .unwrap();
    let id = first
        .add_document("Mba'éichapa", "gn", Metadata::new())
        .unwrap();
    first.close().unwrap();

    let snapshot = backend.snapshot.lock().clone().unwrap();
    assert_eq!(snapshot.header.document_count, 1);
    // Nothing written through the JSON backend
    assert!(!temp_dir.path().join("data").join("snapshot.json").exists());

    let second = VectorDatabase::builder(settings_in(&temp_dir))
        .metadata_backend(backend)
        .build()
        .unwrap();
    assert_eq!(second.load().unwrap(), 1);
    assert_eq!(second.get_document(&id).unwrap().language, "gn");
}

#[test]
fn test_embedding_backend_is_used_and_normalized() {
    let db = VectorDatabase::builder(in_memory_settings())
        .embedding_backend(Arc::new(AxisBackend))
        .build()
        .unwrap();

    let embedding = db.embed("Ba'ax ka wa'alik", "yua");
    assert_eq!(embedding.source, EmbeddingSource::Backend);
    assert_eq!(embedding.vector.len(), 512);
    assert!((embedding.vector[0] - 1.0).abs() < 1e-6);

    // Every text lands on the same axis
    db.add_document("uno", "es", Metadata::new()).unwrap();
    db.add_document("dos", "es", Metadata::new()).unwrap();
    let results = db.search("tres", "es", &SearchOptions::default());
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| (r.similarity - 1.0).abs() < 1e-5));
}

#[test]
fn test_broken_backends_fall_back_to_pseudo_embeddings() {
    let plain = VectorDatabase::new(in_memory_settings()).unwrap();
    let expected = plain.embed("Imaynalla kashanki", "qu");
    assert_eq!(expected.source, EmbeddingSource::Pseudo);

    let failing: Arc<dyn EmbeddingBackend> = Arc::new(FailingBackend);
    let nan: Arc<dyn EmbeddingBackend> = Arc::new(NanBackend);
    for backend in [failing, nan] {
        let db = VectorDatabase::builder(in_memory_settings())
            .embedding_backend(backend)
            .build()
            .unwrap();
        let embedding = db.embed("Imaynalla kashanki", "qu");
        assert_eq!(embedding.source, EmbeddingSource::Pseudo);
        assert_eq!(embedding.vector, expected.vector);

        // Documents are still accepted
        db.add_document("Imaynalla kashanki", "qu", Metadata::new())
            .unwrap();
        assert_eq!(db.stats().fallback_embeddings, 0);
    }
}

#[test]
fn test_every_index_kind_answers_queries() {
    for kind in [IndexKind::Flat, IndexKind::Ivf, IndexKind::Hnsw] {
        let mut settings = in_memory_settings();
        settings.index.kind = kind;
        settings.index.training_threshold = 8;
        let db = VectorDatabase::new(settings).unwrap();

        for i in 0..40 {
            db.add_document(&format!("t'aan {i}"), "yua", Metadata::new())
                .unwrap();
        }
        db.optimize();

        let options = SearchOptions::default().with_top_k(3).with_threshold(-1.0);
        let results = db.search("t'aan 12", "yua", &options);
        assert_eq!(results.len(), 3, "{kind}");
        assert_eq!(results[0].text.as_deref(), Some("t'aan 12"), "{kind}");
        assert_eq!(db.stats().index_kind, kind);
    }
}
