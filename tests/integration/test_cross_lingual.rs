//! Searches that span several language indices.

use glossa::{Metadata, SearchOptions};

use crate::common::in_memory_db;

#[test]
fn test_end_to_end_three_languages() {
    let db = in_memory_db();
    db.add_document("bonjour", "fr", Metadata::new()).unwrap();
    let maya = db
        .add_document("Ba'ax ka wa'alik", "yua", Metadata::new())
        .unwrap();
    db.add_document("Rimaykullayki", "qu", Metadata::new())
        .unwrap();

    let options = SearchOptions::default().cross_lingual(true).with_top_k(3);
    let results = db.search("Ba'ax ka wa'alik", "yua", &options);

    assert!(!results.is_empty());
    assert_eq!(results[0].doc_id, maya);
    assert_eq!(results[0].language.as_deref(), Some("yua"));
    assert!((results[0].similarity - 1.0).abs() < 1e-5);
    assert!(results.iter().all(|r| r.similarity >= options.threshold));
}

#[test]
fn test_global_top_k_is_never_per_language() {
    let db = in_memory_db();
    // fr, es and en share the 384-dimension multilingual model
    for language in ["fr", "es", "en"] {
        for i in 0..4 {
            db.add_document(&format!("{language} sentence {i}"), language, Metadata::new())
                .unwrap();
        }
    }

    let options = SearchOptions::default()
        .cross_lingual(true)
        .with_top_k(4)
        .with_threshold(-1.0);
    let results = db.search("fr sentence 0", "fr", &options);

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].language.as_deref(), Some("fr"));
    for pair in results.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
    let languages: std::collections::BTreeSet<_> =
        results.iter().filter_map(|r| r.language.clone()).collect();
    assert!(languages.iter().all(|l| ["fr", "es", "en"].contains(&l.as_str())));
}

#[test]
fn test_indices_of_other_dimension_are_skipped() {
    let db = in_memory_db();
    db.add_document("Rimaykullayki", "qu", Metadata::new())
        .unwrap();
    db.add_document("Mba'éichapa", "gn", Metadata::new())
        .unwrap();

    // yua queries are 512-dimensional; qu and gn indices are 768
    let options = SearchOptions::default()
        .cross_lingual(true)
        .with_threshold(-1.0);
    assert!(db.search("Rimaykullayki", "yua", &options).is_empty());

    let results = db.search("Rimaykullayki", "nah", &options);
    assert_eq!(results.len(), 2);
}

#[test]
fn test_unknown_query_language_still_searches_everything() {
    let db = in_memory_db();
    let id = db.add_document("hello", "en", Metadata::new()).unwrap();

    // "de" falls back to the multilingual model, which en also uses
    let options = SearchOptions::default().cross_lingual(true);
    let results = db.search("hello", "de", &options);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_id, id);
}
