//! Language-independent phonetic profile of a text.

use serde::{Deserialize, Serialize};

const EJECTIVE_BASES: &[char] = &['k', 'p', 't', 's', 'c', 'x'];
const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u', 'á', 'é', 'í', 'ó', 'ú', 'à', 'è', 'ì', 'ò', 'ù'];
const NASAL_VOWELS: &[char] = &['ã', 'ĩ', 'ũ', 'ỹ', 'ñ'];

const GLOTTAL_WEIGHT: f32 = 0.2;
const EJECTIVE_WEIGHT: f32 = 0.3;
const LONG_VOWEL_WEIGHT: f32 = 0.1;
const NASAL_WEIGHT: f32 = 0.15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneticProfile {
    pub glottal_stops: bool,
    pub ejectives: bool,
    pub long_vowels: bool,
    pub nasalization: bool,
    /// Sum of the weights of the markers present.
    pub complexity_score: f32,
}

impl PhoneticProfile {
    pub fn analyze(text: &str) -> Self {
        let chars: Vec<char> = text.to_lowercase().chars().collect();

        let glottal_stops = chars.iter().any(|&c| c == '\'' || c == 'ʔ');
        let ejectives = chars
            .windows(2)
            .any(|w| EJECTIVE_BASES.contains(&w[0]) && w[1] == '\'');
        let long_vowels = chars
            .windows(2)
            .any(|w| VOWELS.contains(&w[0]) && VOWELS.contains(&w[1]));
        let nasalization = chars.iter().any(|c| NASAL_VOWELS.contains(c));

        let complexity_score = [
            (glottal_stops, GLOTTAL_WEIGHT),
            (ejectives, EJECTIVE_WEIGHT),
            (long_vowels, LONG_VOWEL_WEIGHT),
            (nasalization, NASAL_WEIGHT),
        ]
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, weight)| weight)
        .sum();

        Self {
            glottal_stops,
            ejectives,
            long_vowels,
            nasalization,
            complexity_score,
        }
    }

    /// Both sides share glottal stops, ejectives or long vowels.
    pub fn shares_signal_with(&self, other: &PhoneticProfile) -> bool {
        (self.glottal_stops && other.glottal_stops)
            || (self.ejectives && other.ejectives)
            || (self.long_vowels && other.long_vowels)
    }
}
