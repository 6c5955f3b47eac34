//! Response interpretation: raw generated text → [`AgentResult`].
//!
//! Generated text is noisy: markdown fences, leading prose, trailing
//! pleasantries, truncation. The interpreter extracts the first balanced
//! JSON object, validates it against the pillar registry, and otherwise
//! returns a deterministic fallback. It never fails.
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | Balanced object with non-empty `summary` | Parsed result |
//! | Pillar with wrong type | Pillar coerced to unknown (null), warning logged |
//! | `metrics` is an array | Metrics discarded, all pillars absent |
//! | No object / bad JSON / no summary | Fallback result |
//!
//! Brace matching does not understand string literals: a `{` or `}` inside
//! a quoted value shifts the detected boundary. This is a known limitation.

use super::result::{AddressedConcern, AgentResult};
use crate::core::string::take_chars;
use crate::pillar::{PillarRegistry, PillarScores, PillarValue};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Characters of raw text kept as the fallback summary.
pub const FALLBACK_SUMMARY_CHARS: usize = 500;
/// Raw text at or below this many characters yields an empty fallback summary.
pub const MIN_FALLBACK_TEXT_CHARS: usize = 10;
/// Details text of the short-input fallback.
pub const PARSE_FAILURE_DETAILS: &str = "Failed to parse";

/// Strip a leading fence line (```` ``` ```` or ```` ```json ````) and a trailing fence.
pub fn strip_code_fence(text: &str) -> &str {
    let mut trimmed = text.trim();
    if trimmed.starts_with("```") {
        trimmed = match trimmed.find('\n') {
            Some(newline) => &trimmed[newline + 1..],
            None => trimmed.trim_start_matches('`'),
        };
    }
    if let Some(stripped) = trimmed.trim_end().strip_suffix("```") {
        trimmed = stripped;
    }
    trimmed.trim()
}

/// Locate the first `{` and return the span up to its matching `}`.
///
/// Returns `None` when no balanced span exists (e.g. truncated output).
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract and parse the first balanced JSON object in `text`.
pub fn parse_json_object(text: &str) -> Option<Map<String, Value>> {
    let span = extract_json_object(strip_code_fence(text))?;
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            debug!("Extracted span is not valid JSON: {}", e);
            None
        }
    }
}

/// Turns raw generated text into structured agent results
#[derive(Debug, Clone, Default)]
pub struct ResponseInterpreter {
    registry: PillarRegistry,
}

impl ResponseInterpreter {
    pub fn new(registry: PillarRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PillarRegistry {
        &self.registry
    }

    /// Interpret raw text, falling back deterministically on failure.
    pub fn interpret(&self, raw: &str) -> AgentResult {
        self.try_interpret(raw).unwrap_or_else(|| {
            warn!(
                "Could not extract a structured result ({} chars); using fallback",
                raw.chars().count()
            );
            self.fallback(raw)
        })
    }

    /// Interpret a backend value that may not be text at all.
    pub fn interpret_value(&self, raw: &Value) -> AgentResult {
        match raw {
            Value::String(text) => self.interpret(text),
            other => self.interpret(&other.to_string()),
        }
    }

    /// Interpret raw text, returning `None` instead of a fallback.
    pub fn try_interpret(&self, raw: &str) -> Option<AgentResult> {
        let object = parse_json_object(raw)?;

        let summary = object
            .get("summary")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())?
            .to_string();

        let details = object
            .get("details")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let metrics = self.filter_metrics(object.get("metrics"));

        let mut result = AgentResult::new(summary, details, metrics)
            .with_concerns(extract_concerns(object.get("concerns")))
            .with_addressed_concerns(extract_addressed(
                object
                    .get("addressedConcerns")
                    .or_else(|| object.get("addressed_concerns")),
            ));
        result.confidence_level = object
            .get("confidenceLevel")
            .or_else(|| object.get("confidence_level"))
            .and_then(Value::as_f64);

        Some(result)
    }

    /// The single fallback contract for unusable output.
    pub fn fallback(&self, raw: &str) -> AgentResult {
        let text = raw.trim();
        let metrics = PillarScores::absent(&self.registry);
        if text.chars().count() <= MIN_FALLBACK_TEXT_CHARS {
            AgentResult::new("", PARSE_FAILURE_DETAILS, metrics)
        } else {
            AgentResult::new(take_chars(text, FALLBACK_SUMMARY_CHARS), "", metrics)
        }
    }

    /// Keep numbers and explicit nulls; wrong types become unknown, missing keys absent.
    ///
    /// Never fabricates a numeric default: unknown stays unknown.
    pub fn filter_metrics(&self, metrics: Option<&Value>) -> PillarScores {
        let mut scores = PillarScores::absent(&self.registry);

        let map = match metrics {
            Some(Value::Object(map)) => map,
            Some(Value::Array(_)) => {
                warn!("metrics field is an array, discarding all pillar values");
                return scores;
            }
            Some(other) => {
                warn!("metrics field has unexpected type: {}", type_name(other));
                return scores;
            }
            None => {
                debug!("metrics field missing, all pillars absent");
                return scores;
            }
        };

        for pillar in self.registry.pillars() {
            let value = match map.get(pillar.key()) {
                Some(Value::Number(n)) => match n.as_f64() {
                    Some(v) => PillarValue::Scored(v),
                    None => PillarValue::Absent,
                },
                Some(Value::Null) => PillarValue::Unknown,
                Some(other) => {
                    warn!(
                        "pillar {} has non-numeric value ({}), treating as unknown",
                        pillar,
                        type_name(other)
                    );
                    PillarValue::Unknown
                }
                None => {
                    debug!("pillar {} missing from metrics", pillar);
                    PillarValue::Absent
                }
            };
            scores.set(*pillar, value);
        }

        let extras: Vec<&String> = map
            .keys()
            .filter(|k| !self.registry.keys().contains(&k.as_str()))
            .collect();
        if !extras.is_empty() {
            debug!("dropping unknown metric keys: {:?}", extras);
        }

        scores
    }
}

fn extract_concerns(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => obj
                .get("concern")
                .or_else(|| obj.get("text"))
                .and_then(Value::as_str),
            _ => None,
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn extract_addressed(value: Option<&Value>) -> Vec<AddressedConcern> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            serde_json::from_value::<AddressedConcern>(item.clone())
                .map_err(|e| debug!("skipping malformed addressed concern: {}", e))
                .ok()
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
