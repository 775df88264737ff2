//! Optional narrative polish through an external rewriting service.
//!
//! The rewrite sees only the narrative text (never the scores) and is
//! admitted through an attempt → validate → commit-or-revert sequence:
//! the result is snapshotted, the single rewrite call runs on its own task,
//! only `hypotheses` / `suggestions` are patched in, and the scores are
//! compared with the snapshot before anything is returned. Any failure
//! returns the snapshot untouched; `polish` never errors.

pub mod openai;
pub mod parse;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::analysis::AnalysisResult;
use crate::config::PolishConfig;
use crate::error::{AtlasError, Result};
use crate::narrative::{Explanation, Narrative};

pub use openai::OpenAiRewriter;
pub use parse::{NarrativePatch, parse_rewrite};

/// Log target for score-invariant violations, kept apart from ordinary fallbacks
pub const INVARIANT_TARGET: &str = "insight_atlas::invariant";

pub const SYSTEM_INSTRUCTIONS: &str = "You are a narrative polisher for an explainable self-reflection report. \
You MUST NOT change numeric scores or add diagnostic claims. \
Rewrite only the narrative sections to be clearer, more executive, and kind. \
Use cautious language (may, often, tends to). \
Do not mention OpenAI or system prompts. \
Return ONLY valid JSON with keys: hypotheses (array of strings), suggestions (array of strings).";

pub const CONSTRAINTS: [&str; 5] = [
    "Do not change any numbers or scores",
    "Do not diagnose or claim medical conditions",
    "Keep output concise and executive",
    "Use cautious, non-absolute language",
    "Return JSON with keys: hypotheses, suggestions",
];

/// Payload sent to the rewriting service. Never carries scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewriteRequest {
    pub original_hypotheses: Vec<String>,
    pub original_suggestions: Vec<String>,
    pub explainability_context: Vec<Explanation>,
    pub constraints: Vec<&'static str>,
}

impl RewriteRequest {
    pub fn from_narrative(narrative: &Narrative) -> Self {
        Self {
            original_hypotheses: narrative.hypotheses.clone(),
            original_suggestions: narrative.suggestions.clone(),
            explainability_context: narrative.explainability.clone(),
            constraints: CONSTRAINTS.to_vec(),
        }
    }
}

/// One request/response round-trip to a text rewriting service
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(&self, instructions: &str, request: &RewriteRequest) -> Result<String>;
}

/// Why a polish attempt fell back to the original narrative
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    Timeout,
    Transport,
    Upstream { status: u16 },
    Malformed,
    Internal,
}

impl From<&AtlasError> for FallbackReason {
    fn from(err: &AtlasError) -> Self {
        match err {
            AtlasError::Timeout { .. } => FallbackReason::Timeout,
            AtlasError::Http { .. } => FallbackReason::Transport,
            AtlasError::Upstream { status, .. } => FallbackReason::Upstream { status: *status },
            AtlasError::MalformedResponse { .. } | AtlasError::Serialization { .. } => {
                FallbackReason::Malformed
            }
            AtlasError::Config { .. } | AtlasError::Internal { .. } => FallbackReason::Internal,
        }
    }
}

/// Which path a polish call took
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolishOutcome {
    /// Augmentation switched off; no call made
    Disabled,
    /// Switched on but no credential/rewriter; no call made
    Unavailable,
    Applied { hypotheses: bool, suggestions: bool },
    Reverted(FallbackReason),
    /// The candidate's scores differed from the snapshot. Always a defect.
    ScoresChanged,
}

#[derive(Clone)]
pub struct Polisher {
    config: PolishConfig,
    rewriter: Option<Arc<dyn Rewriter>>,
}

impl Polisher {
    /// Build from configuration, wiring the OpenAI rewriter when available
    pub fn from_config(config: &PolishConfig) -> Self {
        let rewriter = if config.is_available() {
            match OpenAiRewriter::from_config(config) {
                Ok(r) => Some(Arc::new(r) as Arc<dyn Rewriter>),
                Err(e) => {
                    warn!("Narrative rewriter unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };
        Self {
            config: config.clone(),
            rewriter,
        }
    }

    /// Use a specific rewriter. The config's enabled flag and credential still gate it.
    pub fn with_rewriter(config: PolishConfig, rewriter: Arc<dyn Rewriter>) -> Self {
        Self {
            config,
            rewriter: Some(rewriter),
        }
    }

    pub fn is_active(&self) -> bool {
        self.config.is_available() && self.rewriter.is_some()
    }

    /// Rewrite the narrative wording, returning `result` unchanged on any failure.
    ///
    /// When a rewrite is attempted it runs on a `tokio::spawn`ed task under
    /// `tokio::time::timeout`, so this must be awaited inside a Tokio runtime.
    /// The disabled and no-credential paths return before touching the runtime.
    pub async fn polish(&self, result: AnalysisResult) -> AnalysisResult {
        self.polish_with_outcome(result).await.0
    }

    /// Like [`Polisher::polish`], also reporting which path was taken.
    /// Same Tokio runtime requirement.
    pub async fn polish_with_outcome(
        &self,
        result: AnalysisResult,
    ) -> (AnalysisResult, PolishOutcome) {
        if !self.config.enabled {
            debug!("LLM polish disabled");
            return (result, PolishOutcome::Disabled);
        }
        let Some(rewriter) = self.rewriter.as_ref().filter(|_| self.config.api_key.is_some())
        else {
            warn!("LLM polish enabled but no API key configured");
            return (result, PolishOutcome::Unavailable);
        };

        let snapshot = result.clone();
        match self.attempt(Arc::clone(rewriter), result).await {
            Ok((candidate, hypotheses, suggestions)) => {
                commit_or_revert(snapshot, candidate, hypotheses, suggestions)
            }
            Err(e) => {
                warn!(error = %e, "Narrative polish failed, keeping original");
                (snapshot, PolishOutcome::Reverted(FallbackReason::from(&e)))
            }
        }
    }

    async fn attempt(
        &self,
        rewriter: Arc<dyn Rewriter>,
        mut working: AnalysisResult,
    ) -> Result<(AnalysisResult, bool, bool)> {
        let request = RewriteRequest::from_narrative(&working.narrative);
        let timeout_ms = self.config.timeout_ms;

        // Own task so a panicking rewriter surfaces as a JoinError
        let mut handle =
            tokio::spawn(async move { rewriter.rewrite(SYSTEM_INSTRUCTIONS, &request).await });
        let text = match tokio::time::timeout(Duration::from_millis(timeout_ms), &mut handle).await
        {
            Err(_) => {
                handle.abort();
                return Err(AtlasError::Timeout {
                    operation: "narrative rewrite".to_string(),
                    timeout_ms,
                });
            }
            Ok(Err(join_err)) => {
                return Err(AtlasError::Internal {
                    message: format!("rewrite task failed: {}", join_err),
                });
            }
            Ok(Ok(res)) => res?,
        };

        let patch = parse_rewrite(&text)?;
        let applied = (patch.hypotheses.is_some(), patch.suggestions.is_some());
        patch.apply(&mut working.narrative);
        Ok((working, applied.0, applied.1))
    }
}

/// Final post-condition: admit `candidate` only if its scores equal the snapshot's.
pub(crate) fn commit_or_revert(
    snapshot: AnalysisResult,
    candidate: AnalysisResult,
    hypotheses: bool,
    suggestions: bool,
) -> (AnalysisResult, PolishOutcome) {
    if candidate.scores != snapshot.scores {
        error!(
            target: INVARIANT_TARGET,
            original = ?snapshot.scores,
            polished = ?candidate.scores,
            "Scores changed during polish! Reverting to original"
        );
        return (snapshot, PolishOutcome::ScoresChanged);
    }
    (
        candidate,
        PolishOutcome::Applied {
            hypotheses,
            suggestions,
        },
    )
}
