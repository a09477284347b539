//! Quechua.

use std::sync::Arc;

use tracing::warn;

use super::{FeatureRegistry, LanguageProfile, RootKind, RuleSet};

const PROFILE: LanguageProfile = LanguageProfile {
    code: "qu",
    name: "Quechua",
    phonetic_features: &["aspirated", "ejectives", "retroflex"],
};

const CEREMONIAL: &[&str] = &["inti", "pachamama", "apu", "ayni"];

fn rules() -> Result<RuleSet, regex::Error> {
    RuleSet::new(PROFILE)
        .ejective("[qkp]'")?
        .cluster("ñ|ll")?
        .root(r"^(.*)[yn]i$", RootKind::Verbal)?
        .root(r"^(.*)kuna$", RootKind::Plural)?
        .root(r"^(.*)cha$", RootKind::Diminutive)
        .map(|rules| rules.ceremonial(CEREMONIAL))
}

pub(super) fn register(registry: &mut FeatureRegistry) {
    match rules() {
        Ok(rules) => registry.register(Arc::new(rules)),
        Err(e) => warn!("skipping {} feature rules: {e}", PROFILE.code),
    }
}
