//! Linguistic feature extraction for low-resource languages.
//!
//! Each supported language registers a [`FeatureExtractor`] with the
//! [`FeatureRegistry`]; adding a language means adding a module with a
//! `register` function, never editing a central switch.
//!
//! Extraction never fails. Unknown languages yield word statistics only,
//! with every phonetic flag false and no roots.

mod cultural;
mod gn;
mod nah;
mod phonetic;
mod qu;
mod quc;
mod rules;
mod yua;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use cultural::CulturalContext;
pub use phonetic::PhoneticProfile;
pub use rules::{RootPattern, RuleSet};

/// Upper bound on the importance of a single root.
pub const MAX_ROOT_IMPORTANCE: f32 = 2.0;

/// Phonetic flags and word statistics for one text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub has_glottal_stop: bool,
    pub has_ejective: bool,
    pub has_nasalization: bool,
    pub has_complex_cluster: bool,
    pub word_count: usize,
    pub avg_word_length: f32,
}

impl FeatureSet {
    /// A feature set with only word statistics filled in.
    pub fn with_word_stats(text: &str) -> Self {
        let (count, chars) = text
            .split_whitespace()
            .fold((0usize, 0usize), |(n, total), word| {
                (n + 1, total + word.chars().count())
            });

        Self {
            word_count: count,
            avg_word_length: if count == 0 {
                0.0
            } else {
                chars as f32 / count as f32
            },
            ..Self::default()
        }
    }

    /// Returns `true` if any phonetic flag is set.
    pub fn has_phonetic_markers(&self) -> bool {
        self.has_glottal_stop || self.has_ejective || self.has_nasalization || self.has_complex_cluster
    }
}

/// Morphological category of an extracted root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootKind {
    Verbal,
    Nominal,
    Agentive,
    Diminutive,
    Plural,
    Feminine,
}

impl RootKind {
    /// Weight applied to the length-based importance; verbs weigh most.
    pub fn multiplier(self) -> f32 {
        match self {
            RootKind::Verbal => 1.5,
            RootKind::Nominal => 1.3,
            RootKind::Agentive => 1.2,
            RootKind::Diminutive | RootKind::Plural | RootKind::Feminine => 1.0,
        }
    }
}

/// A morphological root found in one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub root: String,
    pub kind: RootKind,
    pub importance: f32,
    /// The token the root was taken from.
    pub word: String,
}

/// `min(2, ln(len + 1) * multiplier)`, with length counted in characters.
pub fn root_importance(root: &str, kind: RootKind) -> f32 {
    let len = root.chars().count() as f32;
    ((len + 1.0).ln() * kind.multiplier()).min(MAX_ROOT_IMPORTANCE)
}

/// Static description of a supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageProfile {
    pub code: &'static str,
    pub name: &'static str,
    pub phonetic_features: &'static [&'static str],
}

/// Per-language detector for phonetic markers and morphological roots.
pub trait FeatureExtractor: Send + Sync {
    fn profile(&self) -> &LanguageProfile;

    /// Sets the language-specific phonetic flags on `features`.
    fn detect(&self, text: &str, features: &mut FeatureSet);

    /// Applies the morphological patterns to one lower-cased token.
    fn roots_of(&self, word: &str) -> Vec<Root>;

    /// Ceremonial vocabulary used for cultural context detection.
    fn ceremonial_terms(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Table of feature extractors keyed by language code.
#[derive(Clone, Default)]
pub struct FeatureRegistry {
    extractors: HashMap<&'static str, Arc<dyn FeatureExtractor>>,
}

impl std::fmt::Debug for FeatureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}

impl FeatureRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in language registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        yua::register(&mut registry);
        quc::register(&mut registry);
        qu::register(&mut registry);
        nah::register(&mut registry);
        gn::register(&mut registry);
        registry
    }

    /// Registers (or replaces) the extractor for its language.
    pub fn register(&mut self, extractor: Arc<dyn FeatureExtractor>) {
        self.extractors.insert(extractor.profile().code, extractor);
    }

    pub fn get(&self, language: &str) -> Option<&dyn FeatureExtractor> {
        self.extractors.get(language).map(|e| e.as_ref())
    }

    pub fn profile(&self, language: &str) -> Option<&LanguageProfile> {
        self.get(language).map(|e| e.profile())
    }

    /// Registered language codes, sorted.
    pub fn languages(&self) -> Vec<&'static str> {
        let mut codes: Vec<_> = self.extractors.keys().copied().collect();
        codes.sort_unstable();
        codes
    }

    pub fn extract_features(&self, text: &str, language: &str) -> FeatureSet {
        let mut features = FeatureSet::with_word_stats(text);
        if let Some(extractor) = self.get(language) {
            extractor.detect(text, &mut features);
        }
        features
    }

    /// Roots of every whitespace-delimited token, in token order.
    pub fn extract_roots(&self, text: &str, language: &str) -> Vec<Root> {
        let Some(extractor) = self.get(language) else {
            return Vec::new();
        };

        text.to_lowercase()
            .split_whitespace()
            .flat_map(|word| extractor.roots_of(word))
            .collect()
    }

    pub fn cultural_context(&self, text: &str, language: &str) -> CulturalContext {
        let terms = self
            .get(language)
            .map(|e| e.ceremonial_terms())
            .unwrap_or(&[]);
        CulturalContext::analyze(text, terms)
    }
}
