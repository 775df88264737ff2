//! Explainable self-reflection profiling.
//!
//! Free text plus a short Likert survey go through a deterministic
//! extract → score → narrate pipeline ([`analyze`]). The resulting
//! [`AnalysisResult`] may optionally be handed to a [`Polisher`], which
//! rewrites only the narrative wording and never the scores.

pub mod analysis;
pub mod config;
pub mod deserializers;
pub mod error;
pub mod features;
pub mod lexicon;
pub mod narrative;
pub mod polish;
pub mod scoring;
pub mod tables;
pub mod telemetry;

pub use analysis::{AnalysisResult, Analyzer, analyze};
pub use config::{Config, PolishConfig};
pub use error::{AtlasError, Result};
pub use features::{Feature, SurveyAnswers, extract_features};
pub use narrative::{Explanation, Narrative, generate_narrative};
pub use polish::{FallbackReason, PolishOutcome, Polisher, RewriteRequest, Rewriter};
pub use scoring::{BigFive, Scores, Signal, StyleSignals, score_traits};
pub use tables::ProfileTables;
