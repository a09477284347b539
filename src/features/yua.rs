//! Yucatec Maya.

use std::sync::Arc;

use tracing::warn;

use super::{FeatureRegistry, LanguageProfile, RootKind, RuleSet};

const PROFILE: LanguageProfile = LanguageProfile {
    code: "yua",
    name: "Maya Yucateco",
    phonetic_features: &["glottal_stops", "ejectives", "vowel_length"],
};

const CEREMONIAL: &[&str] = &["k'inich", "itzamna", "kukulkan", "chaac"];

fn rules() -> Result<RuleSet, regex::Error> {
    RuleSet::new(PROFILE)
        .glottal("[ʔ']")?
        .ejective("[kptscx]'")?
        .root(r"^(.*)[aeiou]l$", RootKind::Verbal)?
        .root(r"^(.*)[td]aan$", RootKind::Agentive)?
        .root(r"^(.*)[kp]'in$", RootKind::Diminutive)
        .map(|rules| rules.ceremonial(CEREMONIAL))
}

pub(super) fn register(registry: &mut FeatureRegistry) {
    match rules() {
        Ok(rules) => registry.register(Arc::new(rules)),
        Err(e) => warn!("skipping {} feature rules: {e}", PROFILE.code),
    }
}
