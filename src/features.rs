//! Feature extraction: free text + survey answers into a flat list of named
//! numeric features.
//!
//! Everything here is lexical counting. Output order is fixed (see
//! [`FEATURE_ORDER`]) and only matters for display and the explainability
//! subset; scoring looks features up by name.

use crate::deserializers::de_option_f64_lenient;
use crate::lexicon::Lexicons;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Regex for word tokens: maximal runs of ASCII letters and apostrophes
static WORD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z']+").unwrap());

/// Regex for sentence terminators (runs count once)
static SENTENCE_BREAK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

/// Characters counted by `punct_density`
const PUNCTUATION: &[char] = &[',', ';', ':', '—', '-', '(', ')', '<', '>'];

/// Neutral Likert answer used for any missing survey key
pub const NEUTRAL_ANSWER: f64 = 3.0;

/// Feature names, in extraction order.
pub mod names {
    pub const WORD_COUNT: &str = "word_count";
    pub const AVG_SENTENCE_LEN: &str = "avg_sentence_len";
    pub const INTENSIFIER_RATE: &str = "intensifier_rate";
    pub const MODAL_RATE: &str = "modal_rate";
    pub const CERTAINTY_RATE: &str = "certainty_rate";
    pub const EMOTION_RATE: &str = "emotion_rate";
    pub const TECHNICAL_RATE: &str = "technical_rate";
    pub const CREATIVE_RATE: &str = "creative_rate";
    pub const CAPS_RATIO: &str = "caps_ratio";
    pub const PUNCT_DENSITY: &str = "punct_density";
    pub const SURVEY_NOVELTY: &str = "survey_novelty";
    pub const SURVEY_STRUCTURE: &str = "survey_structure";
    pub const SURVEY_SOCIAL: &str = "survey_social";
    pub const SURVEY_SENSITIVITY: &str = "survey_sensitivity";
    pub const SURVEY_FOCUS: &str = "survey_focus";
}

pub const FEATURE_ORDER: [&str; 15] = [
    names::WORD_COUNT,
    names::AVG_SENTENCE_LEN,
    names::INTENSIFIER_RATE,
    names::MODAL_RATE,
    names::CERTAINTY_RATE,
    names::EMOTION_RATE,
    names::TECHNICAL_RATE,
    names::CREATIVE_RATE,
    names::CAPS_RATIO,
    names::PUNCT_DENSITY,
    names::SURVEY_NOVELTY,
    names::SURVEY_STRUCTURE,
    names::SURVEY_SOCIAL,
    names::SURVEY_SENSITIVITY,
    names::SURVEY_FOCUS,
];

/// A single named measurement with a human-readable note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub value: f64,
    pub note: String,
}

impl Feature {
    fn new(name: &str, value: f64, note: &str) -> Self {
        Self {
            name: name.to_string(),
            value,
            note: note.to_string(),
        }
    }
}

/// Likert answers (nominally 1-5). Missing keys fall back to
/// [`NEUTRAL_ANSWER`]; unknown keys are ignored; values are not range-checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyAnswers {
    #[serde(
        deserialize_with = "de_option_f64_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub novelty_seeking: Option<f64>,
    #[serde(
        deserialize_with = "de_option_f64_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub structure_preference: Option<f64>,
    #[serde(
        deserialize_with = "de_option_f64_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub social_energy: Option<f64>,
    #[serde(
        deserialize_with = "de_option_f64_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub sensory_sensitivity: Option<f64>,
    #[serde(
        deserialize_with = "de_option_f64_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub hyperfocus: Option<f64>,
}

impl SurveyAnswers {
    /// Build from `(key, value)` pairs, ignoring keys that are not recognized.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut answers = Self::default();
        for (key, value) in pairs {
            match key {
                "novelty_seeking" => answers.novelty_seeking = Some(value),
                "structure_preference" => answers.structure_preference = Some(value),
                "social_energy" => answers.social_energy = Some(value),
                "sensory_sensitivity" => answers.sensory_sensitivity = Some(value),
                "hyperfocus" => answers.hyperfocus = Some(value),
                other => tracing::trace!(key = other, "ignoring unrecognized survey key"),
            }
        }
        answers
    }

    pub fn novelty(&self) -> f64 {
        self.novelty_seeking.unwrap_or(NEUTRAL_ANSWER)
    }

    pub fn structure(&self) -> f64 {
        self.structure_preference.unwrap_or(NEUTRAL_ANSWER)
    }

    pub fn social(&self) -> f64 {
        self.social_energy.unwrap_or(NEUTRAL_ANSWER)
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensory_sensitivity.unwrap_or(NEUTRAL_ANSWER)
    }

    pub fn focus(&self) -> f64 {
        self.hyperfocus.unwrap_or(NEUTRAL_ANSWER)
    }
}

/// Case-folded word tokens
pub fn words(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD_REGEX
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Non-blank sentence fragments, split on runs of `.`, `!` and `?`
pub fn sentences(text: &str) -> Vec<&str> {
    SENTENCE_BREAK_REGEX
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Share of `count` in `total` as a percentage; an empty total counts as 1.
fn percent(count: usize, total: usize) -> f64 {
    (count as f64 / total.max(1) as f64) * 100.0
}

/// Extract features using the built-in lexicons
pub fn extract_features(free_text: &str, survey: &SurveyAnswers) -> Vec<Feature> {
    extract_features_with(free_text, survey, &crate::tables::DEFAULT_TABLES.lexicons)
}

/// Extract features against a specific lexicon set
pub fn extract_features_with(
    free_text: &str,
    survey: &SurveyAnswers,
    lexicons: &Lexicons,
) -> Vec<Feature> {
    let w = words(free_text);
    let n_words = w.len();
    let n_sent = sentences(free_text).len().max(1);
    let avg_sentence_len = n_words as f64 / n_sent as f64;

    let upper = free_text.chars().filter(|c| c.is_uppercase()).count();
    let alpha = free_text.chars().filter(|c| c.is_alphabetic()).count();
    let punct = free_text.chars().filter(|c| PUNCTUATION.contains(c)).count();
    let length = free_text.chars().count();

    tracing::debug!(
        words = n_words,
        sentences = n_sent,
        chars = length,
        "extracting features"
    );

    vec![
        Feature::new(names::WORD_COUNT, n_words as f64, "Total words in free-text."),
        Feature::new(
            names::AVG_SENTENCE_LEN,
            avg_sentence_len,
            "Average sentence length (words).",
        ),
        Feature::new(
            names::INTENSIFIER_RATE,
            percent(lexicons.intensifiers.count_matches(&w), n_words),
            "Percent of words that are intensifiers.",
        ),
        Feature::new(
            names::MODAL_RATE,
            percent(lexicons.modal.count_matches(&w), n_words),
            "Percent of words that express uncertainty.",
        ),
        Feature::new(
            names::CERTAINTY_RATE,
            percent(lexicons.certainty.count_matches(&w), n_words),
            "Percent of words that express certainty/absolutes.",
        ),
        Feature::new(
            names::EMOTION_RATE,
            percent(lexicons.emotion.count_matches(&w), n_words),
            "Percent of emotion-laden words.",
        ),
        Feature::new(
            names::TECHNICAL_RATE,
            percent(lexicons.technical.count_matches(&w), n_words),
            "Percent of technical lexicon words.",
        ),
        Feature::new(
            names::CREATIVE_RATE,
            percent(lexicons.creative.count_matches(&w), n_words),
            "Percent of creative/aesthetic lexicon words.",
        ),
        Feature::new(
            names::CAPS_RATIO,
            percent(upper, alpha),
            "Uppercase letters as % of alphabetic characters.",
        ),
        Feature::new(
            names::PUNCT_DENSITY,
            percent(punct, length),
            "Punctuation density proxy.",
        ),
        Feature::new(
            names::SURVEY_NOVELTY,
            survey.novelty(),
            "Self-reported novelty seeking (1-5).",
        ),
        Feature::new(
            names::SURVEY_STRUCTURE,
            survey.structure(),
            "Self-reported preference for structure (1-5).",
        ),
        Feature::new(
            names::SURVEY_SOCIAL,
            survey.social(),
            "Self-reported social energy (1-5).",
        ),
        Feature::new(
            names::SURVEY_SENSITIVITY,
            survey.sensitivity(),
            "Self-reported sensory sensitivity (1-5).",
        ),
        Feature::new(
            names::SURVEY_FOCUS,
            survey.focus(),
            "Self-reported hyperfocus tendency (1-5).",
        ),
    ]
}
