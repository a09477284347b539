//! Search and ingestion benchmarks
//!
//! Measures query latency for each ANN backend at a few index sizes, and
//! document ingestion throughput including embedding generation.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use glossa::{IndexKind, Metadata, SearchOptions, Settings, VectorDatabase};
use std::hint::black_box;

const LANGUAGE: &str = "qu";

fn in_memory_db(kind: IndexKind) -> VectorDatabase {
    let mut settings = Settings::default();
    settings.persistence.enabled = false;
    settings.index.kind = kind;
    VectorDatabase::new(settings).expect("Failed to create database")
}

fn populated_db(kind: IndexKind, documents: usize) -> VectorDatabase {
    let db = in_memory_db(kind);
    for i in 0..documents {
        db.add_document(&format!("rimay {i} runasimipi"), LANGUAGE, Metadata::new())
            .expect("Failed to add document");
    }
    db.optimize();
    db
}

/// Query latency per backend and index size
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let options = SearchOptions::default().with_top_k(10).with_threshold(-1.0);

    for size in [500, 2_000] {
        for kind in [IndexKind::Flat, IndexKind::Ivf, IndexKind::Hnsw] {
            let db = populated_db(kind, size);
            // Warm the cache so only the index lookup is measured
            db.embed("rimay 42 runasimipi", LANGUAGE);

            group.bench_with_input(BenchmarkId::new(kind.to_string(), size), &db, |b, db| {
                b.iter(|| black_box(db.search(black_box("rimay 42 runasimipi"), LANGUAGE, &options)));
            });
        }
    }

    group.finish();
}

/// Cross-lingual queries fan out over every index with a matching dimension
fn bench_cross_lingual(c: &mut Criterion) {
    let db = in_memory_db(IndexKind::Flat);
    for i in 0..300 {
        for language in ["fr", "es", "en"] {
            db.add_document(&format!("{language} phrase {i}"), language, Metadata::new())
                .expect("Failed to add document");
        }
    }
    let options = SearchOptions::default()
        .with_top_k(10)
        .with_threshold(-1.0)
        .cross_lingual(true)
        .with_boosts(true);

    c.bench_function("cross_lingual_boosted", |b| {
        b.iter(|| black_box(db.search(black_box("es phrase 7"), "es", &options)));
    });
}

/// Ingestion throughput; every text is new so embeddings are generated
fn bench_add_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_document");
    group.throughput(Throughput::Elements(1));

    for language in ["fr", "yua", "qu"] {
        group.bench_function(language, |b| {
            let db = in_memory_db(IndexKind::Flat);
            let mut counter = 0u64;
            b.iter(|| {
                counter += 1;
                let text = format!("texto {counter}");
                black_box(db.add_document(&text, language, Metadata::new()))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_search, bench_cross_lingual, bench_add_document);
criterion_main!(benches);
