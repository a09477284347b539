//! Save, reopen and recover.

use std::collections::HashSet;
use std::thread;

use glossa::{IndexKind, Metadata, SearchOptions, VectorDatabase};
use tempfile::TempDir;

use crate::common::settings_in;

#[test]
fn test_close_and_reopen_restores_documents() {
    let temp_dir = TempDir::new().unwrap();
    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), serde_json::json!("Popol Wuj"));

    let (maya, kiche) = {
        let db = VectorDatabase::new(settings_in(&temp_dir)).unwrap();
        let maya = db
            .add_document("Ba'ax ka wa'alik", "yua", Metadata::new())
            .unwrap();
        let kiche = db
            .add_document("Xax k'u are u tzijoxik", "quc", metadata)
            .unwrap();
        db.close().unwrap();
        (maya, kiche)
    };

    let data = temp_dir.path().join("data");
    assert!(data.join("snapshot.json").exists());
    assert!(data.join("vectors").join("yua").join("segment_0.vec").exists());
    // Empty preloaded indices write no segment
    assert!(!data.join("vectors").join("fr").exists());

    let db = VectorDatabase::open(settings_in(&temp_dir)).unwrap();
    assert_eq!(db.document_count(), 2);
    let doc = db.get_document(&kiche).unwrap();
    assert_eq!(doc.metadata["source"], "Popol Wuj");
    assert_eq!(doc.model, "mayan");

    let options = SearchOptions::default().with_top_k(1).with_threshold(0.99);
    let results = db.search("Ba'ax ka wa'alik", "yua", &options);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_id, maya);

    // Slots keep increasing after a reload
    let next = db
        .add_document("Bix a beel", "yua", Metadata::new())
        .unwrap();
    assert_eq!(db.get_document(&next).unwrap().vector_slot.get(), 2);
    assert_eq!(db.stats().total_vectors, 3);
}

#[test]
fn test_reopen_with_another_index_kind() {
    let temp_dir = TempDir::new().unwrap();
    {
        let db = VectorDatabase::new(settings_in(&temp_dir)).unwrap();
        for i in 0..30 {
            db.add_document(&format!("rimay {i}"), "qu", Metadata::new())
                .unwrap();
        }
        db.save().unwrap();
    }

    for kind in [IndexKind::Hnsw, IndexKind::Ivf] {
        let mut settings = settings_in(&temp_dir);
        settings.index.kind = kind;
        let db = VectorDatabase::open(settings).unwrap();
        assert_eq!(db.document_count(), 30);
        assert_eq!(db.stats().index_kind, kind);

        let options = SearchOptions::default().with_top_k(1).with_threshold(0.99);
        let results = db.search("rimay 17", "qu", &options);
        assert_eq!(results.len(), 1, "{kind} lost a document");
        assert_eq!(results[0].text.as_deref(), Some("rimay 17"));
    }
}

#[test]
fn test_corrupt_snapshot_starts_empty() {
    let temp_dir = TempDir::new().unwrap();
    let data = temp_dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("snapshot.json"), "{ broken").unwrap();

    let db = VectorDatabase::open(settings_in(&temp_dir)).unwrap();
    assert_eq!(db.document_count(), 0);
    assert!(db.load().is_err());

    // Still fully usable in memory
    db.add_document("bonjour", "fr", Metadata::new()).unwrap();
    assert_eq!(db.search("bonjour", "fr", &SearchOptions::default()).len(), 1);
}

#[test]
fn test_flush_reports_unwritable_directory() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("data");
    // A file where the data directory should be
    std::fs::write(&blocker, "not a directory").unwrap();

    let db = VectorDatabase::new(settings_in(&temp_dir)).unwrap();
    db.add_document("bonjour", "fr", Metadata::new()).unwrap();
    assert!(!db.flush());
    assert!(db.save().is_err());
    assert_eq!(db.document_count(), 1);
}

#[test]
fn test_load_twice_does_not_duplicate() {
    let temp_dir = TempDir::new().unwrap();
    {
        let db = VectorDatabase::new(settings_in(&temp_dir)).unwrap();
        db.add_document("bonjour", "fr", Metadata::new()).unwrap();
        db.close().unwrap();
    }

    let db = VectorDatabase::open(settings_in(&temp_dir)).unwrap();
    assert_eq!(db.load().unwrap(), 0);
    assert_eq!(db.document_count(), 1);
    assert_eq!(db.stats().documents_per_language["fr"], 1);
}

#[test]
fn test_load_into_database_with_documents() {
    let temp_dir = TempDir::new().unwrap();
    let saved = {
        let db = VectorDatabase::new(settings_in(&temp_dir)).unwrap();
        let id = db.add_document("bonjour", "fr", Metadata::new()).unwrap();
        db.add_document("Ba'ax ka wa'alik", "yua", Metadata::new())
            .unwrap();
        db.save().unwrap();
        id
    };

    // Documents added before load hold the slots the snapshot used
    let db = VectorDatabase::new(settings_in(&temp_dir)).unwrap();
    let salut = db.add_document("salut", "fr", Metadata::new()).unwrap();
    let maya = db.add_document("Bix a beel", "yua", Metadata::new()).unwrap();
    assert_eq!(db.load().unwrap(), 2);
    assert_eq!(db.document_count(), 4);
    assert_eq!(db.stats().documents_per_language["fr"], 2);

    let options = SearchOptions::default().with_top_k(5).with_threshold(-1.0);
    for (query, language, id) in [
        ("salut", "fr", &salut),
        ("bonjour", "fr", &saved),
        ("Bix a beel", "yua", &maya),
    ] {
        let results = db.search(query, language, &options);
        assert_eq!(results.len(), 2, "{query}");
        assert_eq!(&results[0].doc_id, id, "{query}");
        assert!((results[0].similarity - 1.0).abs() < 1e-5);
        assert_ne!(results[0].doc_id, results[1].doc_id);
    }

    let slots: HashSet<u32> = [&salut, &saved, &maya]
        .into_iter()
        .map(|id| db.get_document(id).unwrap().vector_slot.get())
        .collect();
    assert_eq!(slots.len(), 3);

    // The merged state survives another round trip
    db.close().unwrap();
    let db = VectorDatabase::open(settings_in(&temp_dir)).unwrap();
    assert_eq!(db.document_count(), 4);
    let results = db.search("salut", "fr", &SearchOptions::default().with_top_k(1));
    assert_eq!(results[0].doc_id, salut);
}

#[test]
fn test_concurrent_autosaves_keep_the_newest_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = settings_in(&temp_dir);
    settings.persistence.autosave_every = 1;

    {
        let db = VectorDatabase::new(settings).unwrap();
        thread::scope(|scope| {
            for (worker, language) in ["fr", "es", "fr", "es"].into_iter().enumerate() {
                let db = &db;
                scope.spawn(move || {
                    for i in 0..15 {
                        db.add_document(&format!("texte {worker} {i}"), language, Metadata::new())
                            .unwrap();
                    }
                });
            }
        });
        assert_eq!(db.document_count(), 60);
        // Dropped without close: only autosaves reached disk
    }

    let db = VectorDatabase::open(settings_in(&temp_dir)).unwrap();
    assert_eq!(db.document_count(), 60);
    assert_eq!(db.stats().documents_per_language["fr"], 30);

    let options = SearchOptions::default().with_top_k(1).with_threshold(0.99);
    let results = db.search("texte 3 14", "es", &options);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text.as_deref(), Some("texte 3 14"));
}
