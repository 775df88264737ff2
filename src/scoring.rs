//! Trait scoring: fixed linear formulas over named features, clamped to
//! [0, 100] and rounded to one decimal.
//!
//! Some terms use unbounded magnitudes (`avg_sentence_len`) next to
//! percentage-bounded ones. The final clamp absorbs the difference; the
//! formulas are kept exactly as calibrated.

use crate::features::{Feature, NEUTRAL_ANSWER, names};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Big-Five style trait proxies (non-diagnostic)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BigFive {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

/// Communication-style signals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleSignals {
    pub intensity: f64,
    pub systems_thinking: f64,
    pub ambiguity_tolerance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub big_five: BigFive,
    pub style_signals: StyleSignals,
}

/// Names every scored quantity, so rule tables can refer to them as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
    Intensity,
    SystemsThinking,
    AmbiguityTolerance,
}

impl Signal {
    pub const ALL: [Signal; 8] = [
        Signal::Openness,
        Signal::Conscientiousness,
        Signal::Extraversion,
        Signal::Agreeableness,
        Signal::Neuroticism,
        Signal::Intensity,
        Signal::SystemsThinking,
        Signal::AmbiguityTolerance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Openness => "openness",
            Signal::Conscientiousness => "conscientiousness",
            Signal::Extraversion => "extraversion",
            Signal::Agreeableness => "agreeableness",
            Signal::Neuroticism => "neuroticism",
            Signal::Intensity => "intensity",
            Signal::SystemsThinking => "systems_thinking",
            Signal::AmbiguityTolerance => "ambiguity_tolerance",
        }
    }
}

impl Scores {
    pub fn get(&self, signal: Signal) -> f64 {
        match signal {
            Signal::Openness => self.big_five.openness,
            Signal::Conscientiousness => self.big_five.conscientiousness,
            Signal::Extraversion => self.big_five.extraversion,
            Signal::Agreeableness => self.big_five.agreeableness,
            Signal::Neuroticism => self.big_five.neuroticism,
            Signal::Intensity => self.style_signals.intensity,
            Signal::SystemsThinking => self.style_signals.systems_thinking,
            Signal::AmbiguityTolerance => self.style_signals.ambiguity_tolerance,
        }
    }
}

/// `max(0, min(100, x))`. A NaN input lands on the upper bound rather than
/// escaping the range.
pub fn clamp_score(x: f64) -> f64 {
    SCORE_MIN.max(SCORE_MAX.min(x))
}

/// Round to `places` decimals, ties to even, judged on the exact binary
/// value of `x` (so `40.45`, stored just above the tie, goes up).
pub fn round_to(x: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = x * factor;
    // exact error of the product; decides ties the multiplication created
    let residual = x.mul_add(factor, -scaled);
    let rounded = if (scaled - scaled.trunc()).abs() == 0.5 && residual != 0.0 {
        if residual > 0.0 {
            scaled.ceil()
        } else {
            scaled.floor()
        }
    } else {
        scaled.round_ties_even()
    };
    rounded / factor
}

fn finish(x: f64) -> f64 {
    round_to(clamp_score(x), 1)
}

/// Name-indexed view over a feature list with per-term defaults
struct FeatureView<'a> {
    values: HashMap<&'a str, f64>,
}

impl<'a> FeatureView<'a> {
    fn new(features: &'a [Feature]) -> Self {
        Self {
            values: features
                .iter()
                .map(|f| (f.name.as_str(), f.value))
                .collect(),
        }
    }

    /// Text-derived feature; absent means 0
    fn text(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    /// Survey-derived feature, centred on the neutral answer; absent means 0
    fn survey_offset(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(NEUTRAL_ANSWER) - NEUTRAL_ANSWER
    }
}

/// Map extracted features to trait proxies and style signals.
pub fn score_traits(features: &[Feature]) -> Scores {
    let f = FeatureView::new(features);

    let openness = 40.0
        + 6.0 * f.text(names::CREATIVE_RATE)
        + 8.0 * f.survey_offset(names::SURVEY_NOVELTY)
        + 0.2 * f.text(names::AVG_SENTENCE_LEN);
    let conscientiousness = 45.0
        + 10.0 * f.survey_offset(names::SURVEY_STRUCTURE)
        + 2.0 * (1.5 - f.text(names::PUNCT_DENSITY) / 10.0);
    let extraversion = 40.0
        + 10.0 * f.survey_offset(names::SURVEY_SOCIAL)
        + 2.0 * f.text(names::CAPS_RATIO) / 10.0;
    let agreeableness =
        50.0 + 3.0 * f.text(names::MODAL_RATE) - 2.0 * f.text(names::CERTAINTY_RATE);
    let neuroticism = 45.0
        + 8.0 * f.survey_offset(names::SURVEY_SENSITIVITY)
        + 2.0 * f.text(names::EMOTION_RATE);

    let intensity = 30.0
        + 12.0 * f.text(names::INTENSIFIER_RATE)
        + 4.0 * f.text(names::CAPS_RATIO) / 10.0
        + 8.0 * f.survey_offset(names::SURVEY_FOCUS);
    let systems_thinking =
        35.0 + 10.0 * f.text(names::TECHNICAL_RATE) + 4.0 * f.text(names::AVG_SENTENCE_LEN);
    let ambiguity_tolerance =
        50.0 + 4.0 * f.text(names::MODAL_RATE) - 4.0 * f.text(names::CERTAINTY_RATE);

    let scores = Scores {
        big_five: BigFive {
            openness: finish(openness),
            conscientiousness: finish(conscientiousness),
            extraversion: finish(extraversion),
            agreeableness: finish(agreeableness),
            neuroticism: finish(neuroticism),
        },
        style_signals: StyleSignals {
            intensity: finish(intensity),
            systems_thinking: finish(systems_thinking),
            ambiguity_tolerance: finish(ambiguity_tolerance),
        },
    };
    tracing::trace!(?scores, "scored traits");
    scores
}
