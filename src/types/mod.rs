//! Core records shared by the index, search and persistence layers.

mod hashing;
mod slot_counter;

pub use hashing::{calculate_hash, document_id, text_hash};
pub use slot_counter::SlotCounter;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::features::{CulturalContext, PhoneticProfile};
use crate::vector::VectorSlot;

/// Opaque caller-supplied metadata.
///
/// A `BTreeMap` keeps keys ordered so the canonical JSON used for document
/// ids is stable.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Stable document identifier: 16 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A stored document with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub text: String,
    pub language: String,
    /// Unit-length embedding; its length is the model dimension.
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
    pub added_at: DateTime<Utc>,
    pub vector_slot: VectorSlot,
    /// Name of the model that produced `embedding`.
    pub model: String,
    #[serde(default)]
    pub cultural_context: CulturalContext,
    #[serde(default)]
    pub phonetic_profile: PhoneticProfile,
}

/// Knobs for a single search call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub top_k: usize,
    /// Minimum cosine similarity; applied to the raw score, never the boosted one.
    pub threshold: f32,
    pub cross_lingual: bool,
    pub include_metadata: bool,
    /// Rank by cultural/phonetic boosted score.
    pub apply_boosts: bool,
    pub cultural_boost: f32,
    pub phonetic_boost: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

impl SearchOptions {
    /// Defaults taken from the `[search]` settings section.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            top_k: config.top_k,
            threshold: config.threshold,
            cross_lingual: false,
            include_metadata: true,
            apply_boosts: false,
            cultural_boost: config.cultural_boost,
            phonetic_boost: config.phonetic_boost,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn cross_lingual(mut self, enabled: bool) -> Self {
        self.cross_lingual = enabled;
        self
    }

    pub fn include_metadata(mut self, enabled: bool) -> Self {
        self.include_metadata = enabled;
        self
    }

    pub fn with_boosts(mut self, enabled: bool) -> Self {
        self.apply_boosts = enabled;
        self
    }
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub doc_id: DocId,
    /// Raw cosine similarity in `[-1, 1]`.
    pub similarity: f32,
    /// Score after cultural/phonetic boosts, capped at 1; set only when boosts apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_score: Option<f32>,
    /// Source language; set for cross-lingual searches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl SearchResult {
    pub fn new(doc_id: DocId, similarity: f32) -> Self {
        Self {
            doc_id,
            similarity,
            adjusted_score: None,
            language: None,
            text: None,
            metadata: None,
            added_at: None,
        }
    }

    /// The score results are ranked by.
    pub fn rank_score(&self) -> f32 {
        self.adjusted_score.unwrap_or(self.similarity)
    }
}
