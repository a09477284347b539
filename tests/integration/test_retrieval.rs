//! Single-language search behaviour of the database facade.

use glossa::{DocId, Metadata, SearchOptions, VectorDatabase};

use crate::common::in_memory_db;

fn add(db: &VectorDatabase, text: &str, language: &str) -> DocId {
    db.add_document(text, language, Metadata::new())
        .expect("valid language")
}

#[test]
fn test_self_retrieval() {
    let db = in_memory_db();
    let id = add(&db, "Ba'ax ka wa'alik", "yua");

    let options = SearchOptions::default().with_top_k(1).with_threshold(0.99);
    let results = db.search("Ba'ax ka wa'alik", "yua", &options);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_id, id);
    assert!((results[0].similarity - 1.0).abs() < 1e-5);
    assert_eq!(results[0].text.as_deref(), Some("Ba'ax ka wa'alik"));
    assert!(results[0].language.is_none());
    assert!(results[0].adjusted_score.is_none());
}

#[test]
fn test_empty_and_unknown_languages_return_nothing() {
    let db = in_memory_db();
    let options = SearchOptions::default().with_threshold(-1.0);

    // Preloaded but empty
    assert!(db.search("Mba'éichapa", "gn", &options).is_empty());
    // Never created
    assert!(db.search("Guten Tag", "de", &options).is_empty());
}

#[test]
fn test_top_k_threshold_and_ordering() {
    let db = in_memory_db();
    for i in 0..20 {
        add(&db, &format!("phrase numéro {i}"), "fr");
    }

    let options = SearchOptions::default().with_top_k(5).with_threshold(-1.0);
    let results = db.search("phrase numéro 3", "fr", &options);
    assert_eq!(results.len(), 5);
    assert!((results[0].similarity - 1.0).abs() < 1e-5);
    for pair in results.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }

    let strict = SearchOptions::default().with_top_k(10).with_threshold(0.5);
    let results = db.search("phrase numéro 3", "fr", &strict);
    assert!(results.len() <= 10);
    assert!(results.iter().all(|r| r.similarity >= 0.5));
}

#[test]
fn test_include_metadata_toggle() {
    let db = in_memory_db();
    let mut metadata = Metadata::new();
    metadata.insert("speaker".to_string(), serde_json::json!("Doña Rosa"));
    db.add_document("Rimaykullayki", "qu", metadata).unwrap();

    let with = SearchOptions::default();
    let result = &db.search("Rimaykullayki", "qu", &with)[0];
    assert_eq!(result.metadata.as_ref().unwrap()["speaker"], "Doña Rosa");
    assert!(result.added_at.is_some());

    let without = SearchOptions::default().include_metadata(false);
    let result = &db.search("Rimaykullayki", "qu", &without)[0];
    assert!(result.text.is_none());
    assert!(result.metadata.is_none());
    assert!(result.added_at.is_none());
}

#[test]
fn test_boosted_ranking() {
    let db = in_memory_db();
    add(&db, "U k'iinil Kukulkan", "yua");
    add(&db, "Bix a beel", "yua");
    add(&db, "Kukulkan", "yua");

    let options = SearchOptions::default()
        .with_top_k(3)
        .with_threshold(-1.0)
        .with_boosts(true);
    let results = db.search("Kukulkan", "yua", &options);

    assert_eq!(results.len(), 3);
    for result in &results {
        let adjusted = result.adjusted_score.expect("boosts requested");
        assert!(adjusted >= result.similarity);
        assert!(adjusted <= 1.0);
    }
    for pair in results.windows(2) {
        assert!(pair[0].rank_score() >= pair[1].rank_score());
    }
    assert_eq!(results[0].text.as_deref(), Some("Kukulkan"));
}

#[test]
fn test_document_ids_are_unique_for_repeated_text() {
    let db = in_memory_db();
    let a = add(&db, "bonjour", "fr");
    let b = add(&db, "bonjour", "fr");
    assert_ne!(a, b);
    assert_eq!(a.as_str().len(), 16);
    assert_eq!(db.document_count(), 2);

    let results = db.search("bonjour", "fr", &SearchOptions::default());
    assert_eq!(results.len(), 2);
}

#[test]
fn test_stats_track_searches_and_cache() {
    let db = in_memory_db();
    add(&db, "bonjour", "fr");
    db.search("bonjour", "fr", &SearchOptions::default());
    db.search("bonjour", "fr", &SearchOptions::default());

    let stats = db.stats();
    assert_eq!(stats.total_documents, 1);
    assert_eq!(stats.total_vectors, 1);
    assert_eq!(stats.search_count, 2);
    assert_eq!(stats.cached_embeddings, 1);
    assert!(stats.cache_hit_rate > 0.5);
    assert_eq!(stats.documents_per_language["fr"], 1);
    assert!(stats.memory.index_bytes > 0);
    assert!(stats.memory.total() >= stats.memory.metadata_bytes);

    db.clear_cache();
    assert_eq!(db.stats().cached_embeddings, 0);
}
