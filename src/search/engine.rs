//! Single-language and cross-lingual similarity search.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::boost::{QuerySignals, adjusted_score};
use crate::embedding::EmbeddingGenerator;
use crate::features::FeatureRegistry;
use crate::index::{IndexRegistry, SharedIndex};
use crate::stats::Stats;
use crate::storage::MetadataStore;
use crate::types::{Document, SearchOptions, SearchResult};

/// A hit before enrichment.
struct Candidate {
    document: Arc<Document>,
    similarity: f32,
    adjusted: Option<f32>,
}

impl Candidate {
    fn rank(&self) -> f32 {
        self.adjusted.unwrap_or(self.similarity)
    }
}

/// Runs queries against the language indices of one database.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    indices: Arc<IndexRegistry>,
    generator: Arc<EmbeddingGenerator>,
    features: Arc<FeatureRegistry>,
    metadata: MetadataStore,
    stats: Arc<Stats>,
}

impl SearchEngine {
    pub fn new(
        indices: Arc<IndexRegistry>,
        generator: Arc<EmbeddingGenerator>,
        features: Arc<FeatureRegistry>,
        metadata: MetadataStore,
        stats: Arc<Stats>,
    ) -> Self {
        Self {
            indices,
            generator,
            features,
            metadata,
            stats,
        }
    }

    /// Ranked hits for `query`, never an error.
    ///
    /// At most `top_k` results are returned in total, each with similarity
    /// at or above `threshold`, sorted by descending score.
    pub fn search(&self, query: &str, language: &str, options: &SearchOptions) -> Vec<SearchResult> {
        let started = Instant::now();
        let results = self.run(query, language, options);
        let elapsed = started.elapsed();
        self.stats.record_search(elapsed);
        debug!(
            language,
            cross_lingual = options.cross_lingual,
            results = results.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "search finished"
        );
        results
    }

    fn run(&self, query: &str, language: &str, options: &SearchOptions) -> Vec<SearchResult> {
        if options.top_k == 0 {
            return Vec::new();
        }

        let targets: Vec<(String, SharedIndex)> = if options.cross_lingual {
            self.indices.all()
        } else {
            match self.indices.get(language) {
                Some(index) => vec![(language.to_string(), index)],
                None => {
                    debug!(language, "no index for language");
                    return Vec::new();
                }
            }
        };

        let embedding = self.generator.generate(query, language);
        let signals = options
            .apply_boosts
            .then(|| QuerySignals::analyze(&self.features, query, language));

        let mut candidates = Vec::new();
        for (_, index) in &targets {
            let index = index.read();
            // Boosts can reorder hits, so every hit above threshold competes
            let fetch = if signals.is_some() {
                index.len()
            } else {
                options.top_k
            };
            for (document, similarity) in index.search(&embedding.vector, fetch, options.threshold) {
                let adjusted = signals
                    .as_ref()
                    .map(|s| adjusted_score(similarity, &document, s, options));
                candidates.push(Candidate {
                    document,
                    similarity,
                    adjusted,
                });
            }
        }

        candidates.sort_by(|a, b| {
            b.rank()
                .partial_cmp(&a.rank())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.document.vector_slot.cmp(&b.document.vector_slot))
        });
        candidates.truncate(options.top_k);

        candidates
            .into_iter()
            .map(|candidate| self.to_result(candidate, options))
            .collect()
    }

    fn to_result(&self, candidate: Candidate, options: &SearchOptions) -> SearchResult {
        let mut result = SearchResult::new(candidate.document.id.clone(), candidate.similarity);
        result.adjusted_score = candidate.adjusted;
        if options.cross_lingual {
            result.language = Some(candidate.document.language.clone());
        }
        if options.include_metadata {
            let record = self
                .metadata
                .get(&candidate.document.id)
                .unwrap_or(candidate.document);
            result.text = Some(record.text.clone());
            result.metadata = Some(record.metadata.clone());
            result.added_at = Some(record.added_at);
        }
        result
    }
}
