//! Cultural context signals: ceremonial vocabulary, calendar terms and
//! sacred numbers.

use serde::{Deserialize, Serialize};

/// Day, month and period names from Mesoamerican and Andean calendars.
const CALENDAR_TERMS: &[&str] = &["k'in", "q'ij", "inti", "tonalli", "winal", "tun"];

const SACRED_NUMBERS: &[u32] = &[4, 9, 13, 20, 52, 260, 365];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CulturalContext {
    /// Ceremonial terms of the document's language found in the text.
    pub concepts: Vec<String>,
    /// Calendar terms found as whole words.
    pub calendar_references: Vec<String>,
    /// Sacred numbers found as whole numbers.
    pub sacred_numbers: Vec<u32>,
}

/// Splits into word tokens; apostrophes and glottal marks stay inside words.
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == 'ʔ'))
        .filter(|t| !t.is_empty())
}

impl CulturalContext {
    pub fn analyze(text: &str, ceremonial_terms: &[&str]) -> Self {
        let lowered = text.to_lowercase();
        let mut context = Self::default();

        for term in ceremonial_terms {
            if lowered.contains(term) {
                context.concepts.push((*term).to_string());
            }
        }

        for token in tokens(&lowered) {
            if CALENDAR_TERMS.contains(&token) && !context.calendar_references.iter().any(|t| t == token) {
                context.calendar_references.push(token.to_string());
            }
            if let Ok(number) = token.parse::<u32>() {
                if SACRED_NUMBERS.contains(&number) && !context.sacred_numbers.contains(&number) {
                    context.sacred_numbers.push(number);
                }
            }
        }

        context
    }

    pub fn has_ceremonial_language(&self) -> bool {
        !self.concepts.is_empty()
    }

    pub fn has_signal(&self) -> bool {
        self.has_ceremonial_language()
            || !self.calendar_references.is_empty()
            || !self.sacred_numbers.is_empty()
    }

    /// Both sides carry the same kind of cultural signal.
    pub fn shares_signal_with(&self, other: &CulturalContext) -> bool {
        (self.has_ceremonial_language() && other.has_ceremonial_language())
            || (!self.calendar_references.is_empty() && !other.calendar_references.is_empty())
            || (!self.sacred_numbers.is_empty() && !other.sacred_numbers.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceremonial_terms_are_substring_matched() {
        let context = CulturalContext::analyze("U k'iinil Kukulkan", &["kukulkan", "chaac"]);
        assert_eq!(context.concepts, vec!["kukulkan"]);
        assert!(context.has_ceremonial_language());
    }

    #[test]
    fn test_calendar_terms_need_word_boundaries() {
        let context = CulturalContext::analyze("Inti raymi, tunkul", &[]);
        assert_eq!(context.calendar_references, vec!["inti"]);

        let context = CulturalContext::analyze("k'inich", &[]);
        assert!(context.calendar_references.is_empty());
    }

    #[test]
    fn test_sacred_numbers() {
        let context = CulturalContext::analyze("13 baktun, 260 days, 14 nights, 13 again", &[]);
        assert_eq!(context.sacred_numbers, vec![13, 260]);
        assert!(CulturalContext::analyze("1300", &[]).sacred_numbers.is_empty());
    }

    #[test]
    fn test_shared_signal() {
        let a = CulturalContext::analyze("winal 20", &[]);
        let b = CulturalContext::analyze("q'ij", &[]);
        let c = CulturalContext::analyze("hello", &[]);
        assert!(a.shares_signal_with(&b));
        assert!(!a.shares_signal_with(&c));
        assert!(!c.has_signal());
    }
}
