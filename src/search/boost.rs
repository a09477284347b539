//! Cultural and phonetic score boosts.

use crate::features::{CulturalContext, FeatureRegistry, PhoneticProfile};
use crate::types::{Document, SearchOptions};

/// Signals of the query text that documents are compared against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySignals {
    pub cultural: CulturalContext,
    pub phonetic: PhoneticProfile,
}

impl QuerySignals {
    pub fn analyze(features: &FeatureRegistry, query: &str, language: &str) -> Self {
        Self {
            cultural: features.cultural_context(query, language),
            phonetic: PhoneticProfile::analyze(query),
        }
    }
}

/// `min(1, similarity + boosts)`.
pub fn adjusted_score(
    similarity: f32,
    document: &Document,
    signals: &QuerySignals,
    options: &SearchOptions,
) -> f32 {
    let mut score = similarity;
    if signals.cultural.shares_signal_with(&document.cultural_context) {
        score += options.cultural_boost;
    }
    if signals.phonetic.shares_signal_with(&document.phonetic_profile) {
        score += options.phonetic_boost;
    }
    score.min(1.0)
}
