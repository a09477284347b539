//! Guaraní.

use std::sync::Arc;

use tracing::warn;

use super::{FeatureRegistry, LanguageProfile, RuleSet};

const PROFILE: LanguageProfile = LanguageProfile {
    code: "gn",
    name: "Guaraní",
    phonetic_features: &["nasalization"],
};

fn rules() -> Result<RuleSet, regex::Error> {
    RuleSet::new(PROFILE).nasal("[ãĩũỹ]")
}

pub(super) fn register(registry: &mut FeatureRegistry) {
    match rules() {
        Ok(rules) => registry.register(Arc::new(rules)),
        Err(e) => warn!("skipping {} feature rules: {e}", PROFILE.code),
    }
}
