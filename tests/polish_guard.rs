//! The polish step may reword the narrative but never touch scores

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use insight_atlas::error::{AtlasError, Result};
use insight_atlas::polish::{FallbackReason, PolishOutcome, Polisher, RewriteRequest, Rewriter};
use insight_atlas::{AnalysisResult, PolishConfig, SurveyAnswers, analyze};

enum Reply {
    Text(&'static str),
    Fail(u16),
    Slow(Duration),
    Panic,
}

struct ScriptedRewriter {
    reply: Reply,
    calls: AtomicUsize,
}

impl ScriptedRewriter {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Rewriter for ScriptedRewriter {
    async fn rewrite(&self, _instructions: &str, request: &RewriteRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!request.original_hypotheses.is_empty());
        match &self.reply {
            Reply::Text(t) => Ok(t.to_string()),
            Reply::Fail(status) => Err(AtlasError::Upstream {
                status: *status,
                body: "boom".into(),
            }),
            Reply::Slow(d) => {
                tokio::time::sleep(*d).await;
                Ok(r#"{"hypotheses": ["too late"]}"#.to_string())
            }
            Reply::Panic => panic!("rewriter blew up"),
        }
    }
}

fn enabled() -> PolishConfig {
    PolishConfig {
        enabled: true,
        api_key: Some("sk-test".into()),
        timeout_ms: 200,
        ..Default::default()
    }
}

fn sample() -> AnalysisResult {
    let survey = SurveyAnswers {
        novelty_seeking: Some(5.0),
        hyperfocus: Some(5.0),
        ..Default::default()
    };
    analyze(
        "I really love building a CLI for the JSON API. Maybe it should feel dreamy.",
        &survey,
    )
}

async fn run(reply: Reply) -> (AnalysisResult, AnalysisResult, PolishOutcome, usize) {
    let original = sample();
    let rewriter = ScriptedRewriter::new(reply);
    let polisher = Polisher::with_rewriter(enabled(), rewriter.clone());
    let (out, outcome) = polisher.polish_with_outcome(original.clone()).await;
    (original, out, outcome, rewriter.calls())
}

#[tokio::test]
async fn test_disabled_is_identity_without_calls() {
    let original = sample();
    let rewriter = ScriptedRewriter::new(Reply::Text(r#"{"hypotheses": ["x"]}"#));
    let config = PolishConfig {
        enabled: false,
        ..enabled()
    };
    let polisher = Polisher::with_rewriter(config, rewriter.clone());
    let (out, outcome) = polisher.polish_with_outcome(original.clone()).await;
    assert_eq!(out, original);
    assert_eq!(outcome, PolishOutcome::Disabled);
    assert_eq!(rewriter.calls(), 0);
}

#[tokio::test]
async fn test_missing_key_is_identity_without_calls() {
    let original = sample();
    let rewriter = ScriptedRewriter::new(Reply::Text(r#"{"hypotheses": ["x"]}"#));
    let config = PolishConfig {
        api_key: None,
        ..enabled()
    };
    let polisher = Polisher::with_rewriter(config, rewriter.clone());
    assert!(!polisher.is_active());
    let out = polisher.polish(original.clone()).await;
    assert_eq!(out, original);
    assert_eq!(rewriter.calls(), 0);
}

#[tokio::test]
async fn test_valid_rewrite_replaces_only_narrative_text() {
    let (original, out, outcome, calls) = run(Reply::Text(
        r#"{"hypotheses": ["You may enjoy novel ideas."], "suggestions": ["Try short sprints."]}"#,
    ))
    .await;
    assert_eq!(calls, 1);
    assert_eq!(
        outcome,
        PolishOutcome::Applied {
            hypotheses: true,
            suggestions: true
        }
    );
    assert_eq!(out.scores, original.scores);
    assert_eq!(out.narrative.hypotheses, vec!["You may enjoy novel ideas.".to_string()]);
    assert_eq!(out.narrative.suggestions, vec!["Try short sprints.".to_string()]);
    assert_eq!(out.narrative.explainability, original.narrative.explainability);
    assert_eq!(out.narrative.disclaimer, original.narrative.disclaimer);
}

#[tokio::test]
async fn test_partial_rewrite_keeps_other_field() {
    let (original, out, outcome, _) =
        run(Reply::Text("```json\n{\"suggestions\": [\"Breathe.\"]}\n```")).await;
    assert_eq!(
        outcome,
        PolishOutcome::Applied {
            hypotheses: false,
            suggestions: true
        }
    );
    assert_eq!(out.narrative.hypotheses, original.narrative.hypotheses);
    assert_eq!(out.narrative.suggestions, vec!["Breathe.".to_string()]);
}

#[tokio::test]
async fn test_injected_scores_are_ignored() {
    let (original, out, _, _) = run(Reply::Text(
        r#"{"hypotheses": ["h"], "scores": {"big_five": {"openness": 99.0}}}"#,
    ))
    .await;
    assert_eq!(out.scores, original.scores);
    assert_eq!(out.narrative.hypotheses, vec!["h".to_string()]);
}

#[tokio::test]
async fn test_garbage_reply_falls_back() {
    let (original, out, outcome, calls) = run(Reply::Text("I'd rather not.")).await;
    assert_eq!(calls, 1);
    assert_eq!(out, original);
    assert_eq!(outcome, PolishOutcome::Reverted(FallbackReason::Malformed));
}

#[tokio::test]
async fn test_mis_shaped_reply_falls_back() {
    let (original, out, outcome, _) =
        run(Reply::Text(r#"{"hypotheses": "one string", "suggestions": ["ok"]}"#)).await;
    assert_eq!(out, original);
    assert_eq!(outcome, PolishOutcome::Reverted(FallbackReason::Malformed));
}

#[tokio::test]
async fn test_upstream_error_falls_back() {
    let (original, out, outcome, _) = run(Reply::Fail(503)).await;
    assert_eq!(out, original);
    assert_eq!(
        outcome,
        PolishOutcome::Reverted(FallbackReason::Upstream { status: 503 })
    );
}

#[tokio::test]
async fn test_slow_rewriter_times_out() {
    let (original, out, outcome, calls) = run(Reply::Slow(Duration::from_secs(5))).await;
    assert_eq!(calls, 1);
    assert_eq!(out, original);
    assert_eq!(outcome, PolishOutcome::Reverted(FallbackReason::Timeout));
}

#[tokio::test]
async fn test_panicking_rewriter_falls_back() {
    let (original, out, outcome, _) = run(Reply::Panic).await;
    assert_eq!(out, original);
    assert_eq!(outcome, PolishOutcome::Reverted(FallbackReason::Internal));
}
