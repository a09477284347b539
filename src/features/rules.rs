//! Table-driven extractor shared by the built-in languages.

use regex::Regex;

use super::{FeatureExtractor, FeatureSet, LanguageProfile, Root, RootKind, root_importance};

/// A suffix or prefix pattern whose first capture group is the root.
#[derive(Debug, Clone)]
pub struct RootPattern {
    regex: Regex,
    kind: RootKind,
}

impl RootPattern {
    pub fn new(pattern: &str, kind: RootKind) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            kind,
        })
    }

    fn apply(&self, word: &str) -> Option<Root> {
        let captures = self.regex.captures(word)?;
        let root = captures.get(1)?.as_str();
        if root.is_empty() {
            return None;
        }
        Some(Root {
            root: root.to_string(),
            kind: self.kind,
            importance: root_importance(root, self.kind),
            word: word.to_string(),
        })
    }
}

/// Regex rules for one language, assembled with the builder methods.
#[derive(Debug, Clone)]
pub struct RuleSet {
    profile: LanguageProfile,
    glottal: Option<Regex>,
    ejective: Option<Regex>,
    nasal: Option<Regex>,
    cluster: Option<Regex>,
    roots: Vec<RootPattern>,
    ceremonial: &'static [&'static str],
}

impl RuleSet {
    pub fn new(profile: LanguageProfile) -> Self {
        Self {
            profile,
            glottal: None,
            ejective: None,
            nasal: None,
            cluster: None,
            roots: Vec::new(),
            ceremonial: &[],
        }
    }

    pub fn glottal(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.glottal = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn ejective(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.ejective = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn nasal(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.nasal = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn cluster(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.cluster = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn root(mut self, pattern: &str, kind: RootKind) -> Result<Self, regex::Error> {
        self.roots.push(RootPattern::new(pattern, kind)?);
        Ok(self)
    }

    pub fn ceremonial(mut self, terms: &'static [&'static str]) -> Self {
        self.ceremonial = terms;
        self
    }
}

fn matches(rule: &Option<Regex>, text: &str) -> bool {
    rule.as_ref().is_some_and(|r| r.is_match(text))
}

impl FeatureExtractor for RuleSet {
    fn profile(&self) -> &LanguageProfile {
        &self.profile
    }

    fn detect(&self, text: &str, features: &mut FeatureSet) {
        features.has_glottal_stop = matches(&self.glottal, text);
        features.has_ejective = matches(&self.ejective, text);
        features.has_nasalization = matches(&self.nasal, text);
        features.has_complex_cluster = matches(&self.cluster, text);
    }

    fn roots_of(&self, word: &str) -> Vec<Root> {
        self.roots.iter().filter_map(|p| p.apply(word)).collect()
    }

    fn ceremonial_terms(&self) -> &'static [&'static str] {
        self.ceremonial
    }
}
