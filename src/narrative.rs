//! Rule-generated narrative: cautious hypotheses, suggestions and a small
//! explainability subset of the features.
//!
//! Rules are independent `(predicate, message)` pairs evaluated in table
//! order. Every rule is checked; a firing rule never suppresses a later one.

use crate::features::{Feature, names};
use crate::scoring::{Scores, Signal, round_to};
use serde::{Deserialize, Serialize};

pub const DISCLAIMER: &str = "This report is a self-reflection aid, not a diagnosis. If you suspect a clinical condition, consult a qualified professional.";

/// Features surfaced in the explainability list, by name
pub const EXPLAINABILITY_FEATURES: [&str; 6] = [
    names::INTENSIFIER_RATE,
    names::TECHNICAL_RATE,
    names::CREATIVE_RATE,
    names::SURVEY_FOCUS,
    names::SURVEY_STRUCTURE,
    names::SURVEY_NOVELTY,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// `value >= threshold`
    AtLeast,
    /// `value > threshold`
    Above,
    /// `value < threshold`
    Below,
    /// `value <= threshold`
    AtMost,
}

impl Comparison {
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::AtLeast => value >= threshold,
            Comparison::Above => value > threshold,
            Comparison::Below => value < threshold,
            Comparison::AtMost => value <= threshold,
        }
    }
}

/// One threshold rule over a single score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeRule {
    pub signal: Signal,
    pub comparison: Comparison,
    pub threshold: f64,
    pub message: String,
}

impl NarrativeRule {
    pub fn new(signal: Signal, comparison: Comparison, threshold: f64, message: &str) -> Self {
        Self {
            signal,
            comparison,
            threshold,
            message: message.to_string(),
        }
    }

    pub fn fires(&self, scores: &Scores) -> bool {
        self.comparison.holds(scores.get(self.signal), self.threshold)
    }
}

/// The ordered rule tables behind a narrative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeRules {
    /// Emitted alone when no hypothesis rule fires
    pub fallback_hypothesis: String,
    /// Always emitted, before any conditional suggestion
    pub baseline_suggestions: Vec<String>,
    pub hypotheses: Vec<NarrativeRule>,
    pub suggestions: Vec<NarrativeRule>,
}

impl Default for NarrativeRules {
    fn default() -> Self {
        use Comparison::{Above, AtLeast, Below};
        Self {
            hypotheses: vec![
                NarrativeRule::new(
                    Signal::Openness,
                    AtLeast,
                    65.0,
                    "High novelty/idea-connection tendency; you likely enjoy remixing concepts across domains.",
                ),
                NarrativeRule::new(
                    Signal::SystemsThinking,
                    AtLeast,
                    65.0,
                    "Strong systems orientation; you may prefer end-to-end plans and dislike vague placeholders.",
                ),
                NarrativeRule::new(
                    Signal::Intensity,
                    AtLeast,
                    65.0,
                    "High intensity signal; your engagement often runs 'all in' when something matters.",
                ),
                NarrativeRule::new(
                    Signal::Conscientiousness,
                    AtLeast,
                    65.0,
                    "Preference for structure and execution; checklists and automation may feel soothing.",
                ),
                NarrativeRule::new(
                    Signal::Neuroticism,
                    AtLeast,
                    65.0,
                    "Higher sensitivity signal; sensory overload or stress spikes may be more likely under chaos.",
                ),
            ],
            fallback_hypothesis: "Mixed/balanced profile; you may flex styles depending on context."
                .to_string(),
            baseline_suggestions: vec![
                "Use a two-pass workflow: (1) wild ideation, (2) ruthless reduction into a minimal shippable unit.".to_string(),
                "If you feel overwhelmed, reduce inputs: dim light, fewer tabs, single-task timers, simple ambient audio.".to_string(),
                "When communicating, state: goal → constraints → definition of done. It lowers friction dramatically.".to_string(),
            ],
            suggestions: vec![
                NarrativeRule::new(
                    Signal::AmbiguityTolerance,
                    Below,
                    45.0,
                    "Ambiguity may feel costly—ask for concrete examples, timelines, and acceptance criteria.",
                ),
                NarrativeRule::new(
                    Signal::Agreeableness,
                    Below,
                    45.0,
                    "Directness can be a superpower; add a 1-line 'warm wrapper' to reduce misreads.",
                ),
                NarrativeRule::new(
                    Signal::Extraversion,
                    Above,
                    60.0,
                    "You may ideate best out loud—voice notes or co-working can amplify output.",
                ),
            ],
        }
    }
}

/// A feature re-expressed for display, value rounded to 2 decimals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub feature: String,
    pub value: f64,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub hypotheses: Vec<String>,
    pub suggestions: Vec<String>,
    pub explainability: Vec<Explanation>,
    pub disclaimer: String,
}

fn fired_messages<'a>(
    rules: &'a [NarrativeRule],
    scores: &'a Scores,
) -> impl Iterator<Item = String> + 'a {
    rules.iter().filter(move |r| r.fires(scores)).map(|r| {
        tracing::trace!(signal = r.signal.as_str(), "narrative rule fired");
        r.message.clone()
    })
}

/// Allow-listed features in extraction order
pub fn explainability(features: &[Feature]) -> Vec<Explanation> {
    features
        .iter()
        .filter(|f| EXPLAINABILITY_FEATURES.contains(&f.name.as_str()))
        .map(|f| Explanation {
            feature: f.name.clone(),
            value: round_to(f.value, 2),
            note: f.note.clone(),
        })
        .collect()
}

/// Generate the narrative with the built-in rule tables
pub fn generate_narrative(scores: &Scores, features: &[Feature]) -> Narrative {
    generate_narrative_with(scores, features, &crate::tables::DEFAULT_TABLES.narrative)
}

pub fn generate_narrative_with(
    scores: &Scores,
    features: &[Feature],
    rules: &NarrativeRules,
) -> Narrative {
    let mut hypotheses: Vec<String> = fired_messages(&rules.hypotheses, scores).collect();
    if hypotheses.is_empty() {
        hypotheses.push(rules.fallback_hypothesis.clone());
    }

    let suggestions: Vec<String> = rules
        .baseline_suggestions
        .iter()
        .cloned()
        .chain(fired_messages(&rules.suggestions, scores))
        .collect();

    Narrative {
        hypotheses,
        suggestions,
        explainability: explainability(features),
        disclaimer: DISCLAIMER.to_string(),
    }
}
