//! Readers and writers sharing one database.

use std::collections::HashSet;
use std::thread;

use glossa::{Metadata, SearchOptions};

use crate::common::in_memory_db;

#[test]
fn test_concurrent_adds_get_unique_slots() {
    let db = in_memory_db();

    let ids: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = ["fr", "qu", "yua", "en"]
            .into_iter()
            .map(|language| {
                let db = &db;
                scope.spawn(move || {
                    (0..25)
                        .map(|i| {
                            db.add_document(&format!("{language} texte {i}"), language, Metadata::new())
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(ids.len(), 100);
    assert_eq!(db.document_count(), 100);

    let slots: HashSet<u32> = ids
        .iter()
        .map(|id| db.get_document(id).unwrap().vector_slot.get())
        .collect();
    assert_eq!(slots.len(), 100);
    assert_eq!(slots.iter().max(), Some(&99));

    let stats = db.stats();
    assert_eq!(stats.total_vectors, 100);
    assert_eq!(stats.documents_per_language["qu"], 25);
}

#[test]
fn test_searches_run_while_writing() {
    let db = in_memory_db();
    db.add_document("Allin p'unchaw", "qu", Metadata::new())
        .unwrap();

    thread::scope(|scope| {
        scope.spawn(|| {
            for i in 0..50 {
                db.add_document(&format!("rimay {i}"), "qu", Metadata::new())
                    .unwrap();
            }
        });

        for _ in 0..4 {
            scope.spawn(|| {
                let options = SearchOptions::default().with_top_k(1).with_threshold(0.99);
                for _ in 0..20 {
                    let results = db.search("Allin p'unchaw", "qu", &options);
                    assert_eq!(results.len(), 1);
                    assert_eq!(results[0].text.as_deref(), Some("Allin p'unchaw"));
                }
            });
        }
    });

    assert_eq!(db.document_count(), 51);
    assert_eq!(db.stats().search_count, 80);
}
