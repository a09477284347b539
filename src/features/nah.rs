//! Nahuatl. No morphological patterns yet; phonetic markers only.

use std::sync::Arc;

use tracing::warn;

use super::{FeatureRegistry, LanguageProfile, RuleSet};

const PROFILE: LanguageProfile = LanguageProfile {
    code: "nah",
    name: "Nahuatl",
    phonetic_features: &["saltillo", "long_vowels", "complex_consonants"],
};

const CEREMONIAL: &[&str] = &["teotl", "tonalli", "tlamatiliztli", "nepantla"];

fn rules() -> Result<RuleSet, regex::Error> {
    RuleSet::new(PROFILE)
        .glottal("'")?
        .cluster("tl")
        .map(|rules| rules.ceremonial(CEREMONIAL))
}

pub(super) fn register(registry: &mut FeatureRegistry) {
    match rules() {
        Ok(rules) => registry.register(Arc::new(rules)),
        Err(e) => warn!("skipping {} feature rules: {e}", PROFILE.code),
    }
}
