//! Closed word lists used for rate features.
//!
//! Membership is an exact, case-insensitive match on a whole token. There is
//! no stemming: "deploy" matches but "deploying" does not.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A fixed set of lowercase tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Lexicon {
    words: BTreeSet<String>,
}

impl Lexicon {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Membership test. Tokens from the extractor are already case-folded,
    /// but callers passing raw words get the same answer.
    pub fn contains(&self, word: &str) -> bool {
        if self.words.contains(word) {
            return true;
        }
        word.chars().any(char::is_uppercase) && self.words.contains(word.to_lowercase().as_str())
    }

    /// Number of tokens in `words` that belong to this lexicon (with repeats).
    pub fn count_matches<S: AsRef<str>>(&self, words: &[S]) -> usize {
        words.iter().filter(|w| self.contains(w.as_ref())).count()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for Lexicon {
    fn from(words: Vec<String>) -> Self {
        Lexicon::new(words)
    }
}

impl From<Lexicon> for Vec<String> {
    fn from(lexicon: Lexicon) -> Self {
        lexicon.words.into_iter().collect()
    }
}

/// The six lexicons the extractor counts against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicons {
    pub intensifiers: Lexicon,
    pub modal: Lexicon,
    pub certainty: Lexicon,
    pub emotion: Lexicon,
    pub technical: Lexicon,
    pub creative: Lexicon,
}

impl Default for Lexicons {
    fn default() -> Self {
        Self {
            intensifiers: Lexicon::new([
                "very",
                "really",
                "absolutely",
                "totally",
                "insanely",
                "extremely",
                "super",
                "so",
            ]),
            modal: Lexicon::new(["maybe", "might", "could", "perhaps", "likely"]),
            certainty: Lexicon::new(["always", "never", "must", "definitely", "certain"]),
            emotion: Lexicon::new([
                "love", "hate", "fear", "hope", "excited", "anxious", "calm",
            ]),
            technical: Lexicon::new([
                "api", "cli", "github", "json", "yaml", "docker", "deploy", "auth", "stripe",
            ]),
            creative: Lexicon::new([
                "poetic",
                "metaphor",
                "vibe",
                "aesthetic",
                "dreamy",
                "mythic",
            ]),
        }
    }
}
