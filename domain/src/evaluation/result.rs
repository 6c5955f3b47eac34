//! Evaluation value objects - immutable results produced by agents.
//!
//! - [`AgentResult`] - one agent's finished analysis for one round
//! - [`AddressedConcern`] - an acknowledgement of a concern raised earlier
//! - [`TokenUsage`] - token accounting for one or more generation calls

use crate::pillar::PillarScores;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token accounting for generation calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub total: u64,
}

const INPUT_KEYS: &[&str] = &[
    "input_tokens",
    "inputTokens",
    "prompt_tokens",
    "promptTokens",
    "promptTokenCount",
    "input",
];
const OUTPUT_KEYS: &[&str] = &[
    "output_tokens",
    "outputTokens",
    "completion_tokens",
    "completionTokens",
    "candidatesTokenCount",
    "output",
];
const TOTAL_KEYS: &[&str] = &["total_tokens", "totalTokens", "totalTokenCount", "total"];

impl TokenUsage {
    pub fn new(input: u64, output: u64) -> Self {
        Self {
            input,
            output,
            total: input.saturating_add(output),
        }
    }

    /// Normalize a backend usage object.
    ///
    /// Backends disagree on field names (`input_tokens`, `prompt_tokens`,
    /// `inputTokens`, `promptTokenCount`, ...). Unknown shapes yield zeros,
    /// and a missing total is derived from input + output.
    ///
    /// ```
    /// use council_domain::evaluation::TokenUsage;
    ///
    /// let usage = TokenUsage::from_usage_value(&serde_json::json!({
    ///     "prompt_tokens": 120,
    ///     "completion_tokens": 30
    /// }));
    /// assert_eq!(usage, TokenUsage::new(120, 30));
    /// ```
    pub fn from_usage_value(value: &Value) -> Self {
        let lookup = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| value.get(*k).and_then(as_count))
        };
        let input = lookup(INPUT_KEYS).unwrap_or(0);
        let output = lookup(OUTPUT_KEYS).unwrap_or(0);
        let total = lookup(TOTAL_KEYS).unwrap_or_else(|| input.saturating_add(output));
        Self {
            input,
            output,
            total,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.total == 0 && self.input == 0 && self.output == 0
    }
}

fn as_count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
}

impl std::ops::Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage {
            input: self.input.saturating_add(rhs.input),
            output: self.output.saturating_add(rhs.output),
            total: self.total.saturating_add(rhs.total),
        }
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for TokenUsage {
    fn sum<I: Iterator<Item = TokenUsage>>(iter: I) -> Self {
        iter.fold(TokenUsage::default(), |acc, u| acc + u)
    }
}

/// Acknowledgement of a concern raised by another agent in an earlier round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressedConcern {
    /// Agent that originally raised the concern
    #[serde(alias = "from_agent", alias = "agent")]
    pub from_agent: String,
    pub concern: String,
    #[serde(default)]
    pub addressed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl AddressedConcern {
    pub fn new(from_agent: impl Into<String>, concern: impl Into<String>, addressed: bool) -> Self {
        Self {
            from_agent: from_agent.into(),
            concern: concern.into(),
            addressed,
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

/// One agent's finished analysis for one round
///
/// Produced once per self-refinement loop and never mutated afterwards;
/// later rounds and the aggregator only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    /// Name of the agent that produced this result (empty until attributed)
    #[serde(default)]
    pub agent_name: String,
    pub summary: String,
    pub details: String,
    pub metrics: PillarScores,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub addressed_concerns: Vec<AddressedConcern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<f64>,
    pub round: usize,
    pub token_usage: TokenUsage,
    pub internal_iterations: usize,
    pub clarity_score: f64,
    #[serde(default)]
    pub missing_information: Vec<String>,
    #[serde(default)]
    pub refinement_notes: Vec<String>,
}

impl AgentResult {
    /// Create an unattributed result with the given core content.
    pub fn new(
        summary: impl Into<String>,
        details: impl Into<String>,
        metrics: PillarScores,
    ) -> Self {
        Self {
            agent_name: String::new(),
            summary: summary.into(),
            details: details.into(),
            metrics,
            concerns: Vec::new(),
            addressed_concerns: Vec::new(),
            confidence_level: None,
            round: 0,
            token_usage: TokenUsage::default(),
            internal_iterations: 0,
            clarity_score: 0.0,
            missing_information: Vec::new(),
            refinement_notes: Vec::new(),
        }
    }

    pub fn with_agent(mut self, name: impl Into<String>) -> Self {
        self.agent_name = name.into();
        self
    }

    pub fn with_round(mut self, round: usize) -> Self {
        self.round = round;
        self
    }

    pub fn with_concerns(mut self, concerns: Vec<String>) -> Self {
        self.concerns = concerns;
        self
    }

    pub fn with_addressed_concerns(mut self, addressed: Vec<AddressedConcern>) -> Self {
        self.addressed_concerns = addressed;
        self
    }

    /// Summary and details joined, for keyword scans.
    pub fn narrative(&self) -> String {
        format!("{}\n{}", self.summary, self.details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pillar::{Pillar, PillarValue};
    use serde_json::json;

    #[test]
    fn test_usage_anthropic_naming() {
        let usage = TokenUsage::from_usage_value(&json!({
            "input_tokens": 100,
            "output_tokens": 40
        }));
        assert_eq!(usage, TokenUsage::new(100, 40));
        assert_eq!(usage.total, 140);
    }

    #[test]
    fn test_usage_camel_case_with_total() {
        let usage = TokenUsage::from_usage_value(&json!({
            "inputTokens": 10,
            "outputTokens": 5,
            "totalTokens": 20
        }));
        assert_eq!(usage.total, 20);
    }

    #[test]
    fn test_usage_gemini_naming() {
        let usage = TokenUsage::from_usage_value(&json!({
            "promptTokenCount": 7,
            "candidatesTokenCount": 3,
            "totalTokenCount": 10
        }));
        assert_eq!(usage, TokenUsage::new(7, 3));
    }

    #[test]
    fn test_usage_unknown_shape_is_zero() {
        assert!(TokenUsage::from_usage_value(&json!("n/a")).is_zero());
        assert!(TokenUsage::from_usage_value(&json!({"tokens": 5})).is_zero());
    }

    #[test]
    fn test_usage_sum() {
        let total: TokenUsage = [TokenUsage::new(1, 2), TokenUsage::new(3, 4)]
            .into_iter()
            .sum();
        assert_eq!(total, TokenUsage::new(4, 6));
    }

    #[test]
    fn test_usage_saturates_on_huge_counts() {
        let usage = TokenUsage::from_usage_value(&json!({
            "input_tokens": u64::MAX,
            "output_tokens": 1
        }));
        assert_eq!(usage.input, u64::MAX);
        assert_eq!(usage.total, u64::MAX);

        let mut running = TokenUsage::new(u64::MAX, 5);
        assert_eq!(running.total, u64::MAX);
        running += TokenUsage::new(10, 10);
        assert_eq!(running.input, u64::MAX);
        assert_eq!(running.output, 15);
        assert_eq!(running.total, u64::MAX);
    }

    #[test]
    fn test_addressed_concern_aliases() {
        let concern: AddressedConcern = serde_json::from_value(json!({
            "from_agent": "qa-engineer",
            "concern": "No tests for the parser",
            "addressed": true
        }))
        .unwrap();
        assert_eq!(concern.from_agent, "qa-engineer");
        assert!(concern.addressed);
        assert!(concern.explanation.is_none());
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let metrics = PillarScores::default().with(Pillar::CodeQuality, PillarValue::Scored(7.0));
        let result = AgentResult::new("ok", "", metrics)
            .with_agent("developer-reviewer")
            .with_round(2);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["agentName"], "developer-reviewer");
        assert_eq!(json["round"], 2);
        assert_eq!(json["metrics"]["codeQuality"], 7.0);
        assert!(json.get("internalIterations").is_some());
        assert!(json.get("confidenceLevel").is_none());
    }
}
