//! Parsing of rewrite responses.
//!
//! Models often wrap JSON in prose or a fenced block, so the parser looks
//! for the first balanced `{...}` span that is valid JSON rather than
//! expecting the whole reply to be JSON.

use crate::error::{AtlasError, Result};
use crate::narrative::Narrative;
use serde_json::Value;

/// The only two narrative fields a rewrite may replace
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativePatch {
    pub hypotheses: Option<Vec<String>>,
    pub suggestions: Option<Vec<String>>,
}

impl NarrativePatch {
    /// Apply into `narrative`, leaving explainability and disclaimer alone
    pub fn apply(self, narrative: &mut Narrative) {
        if let Some(h) = self.hypotheses {
            narrative.hypotheses = h;
            tracing::info!("Polished hypotheses applied");
        }
        if let Some(s) = self.suggestions {
            narrative.suggestions = s;
            tracing::info!("Polished suggestions applied");
        }
    }
}

/// End of the balanced object starting at `start` (which must be `{`),
/// skipping braces inside JSON strings.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// First balanced `{...}` span in `text` that parses as a JSON object
pub fn find_json_object(text: &str) -> Option<(&str, Value)> {
    for (start, _) in text.match_indices('{') {
        let Some(end) = balanced_end(text, start) else {
            continue;
        };
        let span = &text[start..end];
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(span) {
            return Some((span, value));
        }
    }
    None
}

fn string_list(value: &Value, key: &str) -> Result<Vec<String>> {
    let items = value.as_array().ok_or_else(|| AtlasError::MalformedResponse {
        message: format!("'{}' is not an array", key),
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| AtlasError::MalformedResponse {
                    message: format!("'{}' contains a non-string entry", key),
                })
        })
        .collect()
}

/// Parse a rewrite reply into a patch.
///
/// Succeeds only when the reply holds a JSON object with at least one of
/// `hypotheses` / `suggestions` as an array of strings. A present but
/// mis-shaped field rejects the whole reply, so a patch is never partial.
/// Any other keys (including `scores`) are ignored.
pub fn parse_rewrite(text: &str) -> Result<NarrativePatch> {
    let (_, value) = find_json_object(text).ok_or_else(|| AtlasError::MalformedResponse {
        message: "no JSON object found in rewrite response".to_string(),
    })?;

    let hypotheses = value
        .get("hypotheses")
        .map(|v| string_list(v, "hypotheses"))
        .transpose()?;
    let suggestions = value
        .get("suggestions")
        .map(|v| string_list(v, "suggestions"))
        .transpose()?;

    if hypotheses.is_none() && suggestions.is_none() {
        return Err(AtlasError::MalformedResponse {
            message: "response has neither hypotheses nor suggestions".to_string(),
        });
    }

    Ok(NarrativePatch {
        hypotheses,
        suggestions,
    })
}
