//! Pipeline entry: extract → score → narrate.
//!
//! Pure and synchronous. The same `(free_text, survey)` pair always yields
//! the same [`AnalysisResult`].

use crate::features::{self, Feature, SurveyAnswers};
use crate::narrative::{self, Narrative};
use crate::scoring::{self, Scores};
use crate::tables::ProfileTables;
use serde::{Deserialize, Serialize};

/// The unit of output and of the polisher's non-mutation guarantee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub scores: Scores,
    pub narrative: Narrative,
}

/// Runs the deterministic stages against a fixed set of tables.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    tables: ProfileTables,
}

impl Analyzer {
    pub fn new(tables: ProfileTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &ProfileTables {
        &self.tables
    }

    pub fn features(&self, free_text: &str, survey: &SurveyAnswers) -> Vec<Feature> {
        features::extract_features_with(free_text, survey, &self.tables.lexicons)
    }

    pub fn analyze(&self, free_text: &str, survey: &SurveyAnswers) -> AnalysisResult {
        let feats = self.features(free_text, survey);
        let scores = scoring::score_traits(&feats);
        let narrative = narrative::generate_narrative_with(&scores, &feats, &self.tables.narrative);
        tracing::debug!(
            hypotheses = narrative.hypotheses.len(),
            suggestions = narrative.suggestions.len(),
            "analysis complete"
        );
        AnalysisResult { scores, narrative }
    }
}

/// Analyze with the built-in tables
pub fn analyze(free_text: &str, survey: &SurveyAnswers) -> AnalysisResult {
    let feats = features::extract_features(free_text, survey);
    let scores = scoring::score_traits(&feats);
    let narrative = narrative::generate_narrative(&scores, &feats);
    AnalysisResult { scores, narrative }
}
