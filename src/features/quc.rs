//! K'iche'.

use std::sync::Arc;

use tracing::warn;

use super::{FeatureRegistry, LanguageProfile, RootKind, RuleSet};

const PROFILE: LanguageProfile = LanguageProfile {
    code: "quc",
    name: "K'iche'",
    phonetic_features: &["uvulars", "ejectives", "complex_clusters"],
};

const CEREMONIAL: &[&str] = &["q'ij", "winal", "ajaw", "nawal"];

fn rules() -> Result<RuleSet, regex::Error> {
    RuleSet::new(PROFILE)
        .glottal("'")?
        .ejective("[qtzch]'")?
        .root(r"^(.*)[aeiou]j$", RootKind::Verbal)?
        .root(r"^(.*)[aeiou]l$", RootKind::Nominal)?
        .root(r"^x(.*)$", RootKind::Feminine)
        .map(|rules| rules.ceremonial(CEREMONIAL))
}

pub(super) fn register(registry: &mut FeatureRegistry) {
    match rules() {
        Ok(rules) => registry.register(Arc::new(rules)),
        Err(e) => warn!("skipping {} feature rules: {e}", PROFILE.code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureExtractor, FeatureSet};

    #[test]
    fn test_quc_detection() {
        let rules = rules().unwrap();
        let mut features = FeatureSet::default();
        rules.detect("utz'", &mut features);
        assert!(features.has_glottal_stop);
        assert!(features.has_ejective);
        assert!(!features.has_nasalization);
    }

    #[test]
    fn test_quc_nominal_root() {
        let roots = rules().unwrap().roots_of("ulew");
        assert!(roots.is_empty());
        let roots = rules().unwrap().roots_of("achil");
        assert_eq!(roots[0].kind, RootKind::Nominal);
        assert_eq!(roots[0].root, "ach");
    }
}
