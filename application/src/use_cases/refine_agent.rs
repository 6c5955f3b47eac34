//! Refine Agent use case
//!
//! Runs one agent's self-refinement loop for one round:
//!
//! ```text
//! generate ─▶ interpret ─▶ evaluate clarity ─┬─▶ stop ─▶ AgentResult
//!                ▲                           │
//!                └── questions ◀── continue ─┘
//! ```
//!
//! The loop never fails: a backend error or timeout degrades to the
//! interpreter's fallback result and evaluation carries on.

use crate::config::EvaluationParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger, event_types,
};
use crate::ports::llm_gateway::{GatewayError, GenerationRequest, LlmGateway};
use council_domain::{
    AgentDefinition, AgentResult, ClarityEvaluator, PromptTemplate, QuestionTemplates,
    RefinementState, ResponseInterpreter, StopReason, TokenUsage,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Input for one refinement loop
#[derive(Debug, Clone)]
pub struct RefineAgentInput {
    pub agent: AgentDefinition,
    /// Round prompt (initial or discussion) for the first generation
    pub human_prompt: String,
    pub round: usize,
}

impl RefineAgentInput {
    pub fn new(agent: AgentDefinition, human_prompt: impl Into<String>, round: usize) -> Self {
        Self {
            agent,
            human_prompt: human_prompt.into(),
            round,
        }
    }
}

/// Use case for one agent's self-refinement loop
pub struct RefineAgentUseCase<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    interpreter: ResponseInterpreter,
    evaluator: ClarityEvaluator,
    questions: QuestionTemplates,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl<G: LlmGateway + 'static> RefineAgentUseCase<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            interpreter: ResponseInterpreter::default(),
            evaluator: ClarityEvaluator::default(),
            questions: QuestionTemplates::default(),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Use a custom evaluator; the interpreter follows its pillar registry.
    pub fn with_evaluator(mut self, evaluator: ClarityEvaluator) -> Self {
        self.interpreter = ResponseInterpreter::new(evaluator.registry().clone());
        self.evaluator = evaluator;
        self
    }

    pub fn with_question_templates(mut self, questions: QuestionTemplates) -> Self {
        self.questions = questions;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn interpreter(&self) -> &ResponseInterpreter {
        &self.interpreter
    }

    /// Run the loop to completion.
    pub async fn execute(&self, input: RefineAgentInput, params: &EvaluationParams) -> AgentResult {
        let RefineAgentInput {
            agent,
            human_prompt,
            round,
        } = input;
        let profile = params.depth;
        let system = PromptTemplate::agent_system(&agent, self.evaluator.registry());

        // Init: iteration 0
        let (initial, usage) = self
            .generate(&agent, round, 0, &system, &human_prompt, params)
            .await;
        let mut state = RefinementState::new(initial, usage);

        loop {
            let report = self.evaluator.evaluate(state.current(), &agent.expertise);
            let new_gaps = state.observe(&report);
            let questions = self
                .questions
                .questions(&new_gaps, profile.max_self_questions);

            self.conversation_logger.log(ConversationEvent::new(
                event_types::CYCLE_EVALUATED,
                json!({
                    "agent": agent.name,
                    "round": round,
                    "iteration": state.iteration,
                    "clarity": report.score,
                    "new_gaps": new_gaps.iter().map(|g| g.message.as_str()).collect::<Vec<_>>(),
                    "questions": questions,
                }),
            ));
            debug!(
                "{} round {} iteration {}: clarity {:.1}, {} new gap(s)",
                agent.name,
                round,
                state.iteration,
                report.score,
                new_gaps.len()
            );

            if let Some(reason) = StopReason::check(&state, &profile, &new_gaps, &questions) {
                let note = reason.note(&state, &profile);
                info!("{} round {}: {}", agent.name, round, note);
                self.conversation_logger.log(ConversationEvent::new(
                    event_types::REFINEMENT_STOPPED,
                    json!({
                        "agent": agent.name,
                        "round": round,
                        "reason": reason.as_str(),
                        "note": note,
                    }),
                ));
                return state.finish(reason, &profile);
            }

            let prompt = PromptTemplate::refinement_prompt(state.current(), &questions);
            let (candidate, usage) = self
                .generate(&agent, round, state.iteration + 1, &system, &prompt, params)
                .await;
            state.merge(candidate, usage, questions.len());
        }
    }

    /// One generate + interpret cycle. Failures yield the fallback result.
    async fn generate(
        &self,
        agent: &AgentDefinition,
        round: usize,
        iteration: usize,
        system: &str,
        prompt: &str,
        params: &EvaluationParams,
    ) -> (AgentResult, TokenUsage) {
        let request = GenerationRequest::new(system, prompt, params.max_output_tokens);
        self.conversation_logger.log(ConversationEvent::new(
            event_types::PROMPT_SENT,
            json!({
                "agent": agent.name,
                "round": round,
                "iteration": iteration,
                "system": request.system_instructions,
                "prompt": request.human_prompt,
            }),
        ));

        let outcome = match params.generation_timeout {
            Some(limit) => tokio::time::timeout(limit, self.gateway.generate(&request))
                .await
                .unwrap_or(Err(GatewayError::Timeout)),
            None => self.gateway.generate(&request).await,
        };

        let (result, usage) = match outcome {
            Ok(response) => {
                let usage = response
                    .usage
                    .as_ref()
                    .map(TokenUsage::from_usage_value)
                    .unwrap_or_default();
                self.conversation_logger.log(ConversationEvent::new(
                    event_types::RESPONSE_RECEIVED,
                    json!({
                        "agent": agent.name,
                        "round": round,
                        "iteration": iteration,
                        "content": response.content,
                        "usage": usage,
                    }),
                ));
                (self.interpreter.interpret(&response.content), usage)
            }
            Err(e) => {
                warn!(
                    "{} round {} iteration {}: generation failed: {}",
                    agent.name, round, iteration, e
                );
                self.conversation_logger.log(ConversationEvent::new(
                    event_types::GENERATION_FAILED,
                    json!({
                        "agent": agent.name,
                        "round": round,
                        "iteration": iteration,
                        "error": e.to_string(),
                    }),
                ));
                (self.interpreter.fallback(""), TokenUsage::default())
            }
        };

        (result.with_agent(agent.name.clone()).with_round(round), usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::GenerationResponse;
    use async_trait::async_trait;
    use council_domain::{DepthProfile, ExpertiseProfile, Pillar};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    // ==================== Test Mocks ====================

    /// A scripted response for the mock gateway
    #[derive(Debug, Clone)]
    enum Scripted {
        Text(String),
        WithUsage(String, serde_json::Value),
        Error(String),
        Hang,
    }

    /// Mock gateway that returns scripted responses in order
    struct ScriptedGateway {
        responses: Mutex<VecDeque<Scripted>>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedGateway {
        fn new(responses: Vec<Scripted>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationResponse, GatewayError> {
            self.requests.lock().unwrap().push(request.clone());
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Scripted::Error("no more responses".to_string()));
            match next {
                Scripted::Text(t) => Ok(GenerationResponse::new(t)),
                Scripted::WithUsage(t, usage) => Ok(GenerationResponse::new(t).with_usage(usage)),
                Scripted::Error(e) => Err(GatewayError::RequestFailed(e)),
                Scripted::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(GenerationResponse::new("too late"))
                }
            }
        }
    }

    fn single_primary_agent() -> AgentDefinition {
        AgentDefinition::new(
            "business-analyst",
            "Business Analyst",
            "Judges user value.",
            ExpertiseProfile::new(Pillar::CORE.iter().map(|p| {
                if *p == Pillar::FunctionalImpact {
                    (*p, 0.5)
                } else {
                    (*p, 0.08)
                }
            }))
            .unwrap(),
        )
    }

    /// All pillars scored, no justification anywhere.
    fn bare(overrides: &[(&str, f64)], details: &str) -> String {
        let mut metrics = serde_json::json!({
            "functionalImpact": 5,
            "idealTimeHours": 2,
            "testCoverage": 5,
            "codeQuality": 5,
            "codeComplexity": 5,
            "actualTimeHours": 3,
            "technicalDebtHours": 0
        });
        for (key, value) in overrides {
            metrics[*key] = serde_json::json!(value);
        }
        serde_json::json!({
            "summary": "ok",
            "details": details,
            "metrics": metrics
        })
        .to_string()
    }

    /// All pillars scored and justified.
    fn justified() -> String {
        serde_json::json!({
            "summary": "Adds CSV export so users can download their reports directly.",
            "details": "The feature gives users a new export path (impact). Estimate: 3 hours of effort \
                        for a competent engineer. Tests cover the happy path. Readability and naming are good. \
                        Complexity is low with simple branches. The author spent about 4 hours. No new debt.",
            "metrics": {
                "functionalImpact": 7,
                "idealTimeHours": 3,
                "testCoverage": 6,
                "codeQuality": 8,
                "codeComplexity": 3,
                "actualTimeHours": 4,
                "technicalDebtHours": 0
            }
        })
        .to_string()
    }

    fn params(depth: DepthProfile) -> EvaluationParams {
        EvaluationParams::default()
            .with_depth(depth)
            .with_generation_timeout(Some(Duration::from_millis(200)))
    }

    // ==================== Loop Tests ====================

    #[tokio::test]
    async fn test_fast_mode_skips_refinement() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Scripted::Text(bare(&[], ""))]));
        let use_case = RefineAgentUseCase::new(Arc::clone(&gateway));

        let result = use_case
            .execute(
                RefineAgentInput::new(single_primary_agent(), "evaluate", 0),
                &params(DepthProfile::fast()),
            )
            .await;

        assert_eq!(result.internal_iterations, 0);
        assert_eq!(gateway.requests().len(), 1);
        assert_eq!(result.agent_name, "business-analyst");
        assert!((result.clarity_score - 65.0).abs() < 1e-9);
        assert_eq!(result.refinement_notes.len(), 1);
        assert!(result.refinement_notes[0].starts_with("stopped at iteration 0"));
    }

    #[tokio::test]
    async fn test_unjustified_result_triggers_refinement() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Scripted::Text(bare(&[], "")),
            Scripted::Text(justified()),
        ]));
        let use_case = RefineAgentUseCase::new(Arc::clone(&gateway));

        let result = use_case
            .execute(
                RefineAgentInput::new(single_primary_agent(), "evaluate", 1),
                &params(DepthProfile::normal()),
            )
            .await;

        let requests = gateway.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].human_prompt.contains("1. "));
        assert!(requests[1].human_prompt.contains("Your previous analysis"));
        assert_eq!(requests[0].system_instructions, requests[1].system_instructions);

        assert_eq!(result.internal_iterations, 1);
        assert_eq!(result.clarity_score, 100.0);
        assert_eq!(result.round, 1);
        assert!(result.missing_information.is_empty());
        assert_eq!(result.refinement_notes.len(), 2);
        assert_eq!(
            result.refinement_notes[1],
            "stopped at iteration 1: clarity 100% ≥ threshold 80%"
        );
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_and_terminates() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Scripted::Error("503".to_string()),
            Scripted::Error("503".to_string()),
        ]));
        let use_case = RefineAgentUseCase::new(Arc::clone(&gateway));

        let result = use_case
            .execute(
                RefineAgentInput::new(single_primary_agent(), "evaluate", 0),
                &params(DepthProfile::normal()),
            )
            .await;

        // Second cycle rediscovers the same gaps, so the loop stops
        assert_eq!(gateway.requests().len(), 2);
        assert_eq!(result.internal_iterations, 1);
        assert_eq!(result.summary, "");
        assert_eq!(result.details, "Failed to parse");
        assert!(result.metrics.iter().all(|(_, v)| v.as_score().is_none()));
        assert_eq!(result.missing_information.len(), 7);
        assert!(result.refinement_notes.last().unwrap().contains("no new gaps"));
    }

    #[tokio::test]
    async fn test_iteration_limit_bounds_cycles() {
        let profile = DepthProfile {
            max_iterations: 2,
            ..DepthProfile::deep()
        };
        let long = "z".repeat(120);
        let longer = "z".repeat(240);
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Scripted::Text(bare(&[], "")),
            Scripted::Text(bare(&[("functionalImpact", 42.0)], &long)),
            Scripted::Text(bare(&[("testCoverage", 0.0)], &longer)),
            Scripted::Text(justified()),
        ]));
        let use_case = RefineAgentUseCase::new(Arc::clone(&gateway));

        let result = use_case
            .execute(
                RefineAgentInput::new(single_primary_agent(), "evaluate", 0),
                &params(profile),
            )
            .await;

        assert_eq!(gateway.requests().len(), 3);
        assert_eq!(result.internal_iterations, 2);
        assert_eq!(result.details, longer);
        assert!(result.refinement_notes.last().unwrap().contains("iteration limit 2"));
        assert!(!result.missing_information.is_empty());
    }

    #[tokio::test]
    async fn test_token_budget_stops_loop() {
        let profile = DepthProfile {
            token_budget: 1_000,
            ..DepthProfile::normal()
        };
        let gateway = Arc::new(ScriptedGateway::new(vec![Scripted::WithUsage(
            bare(&[], ""),
            serde_json::json!({"prompt_tokens": 900, "completion_tokens": 300}),
        )]));
        let use_case = RefineAgentUseCase::new(Arc::clone(&gateway));

        let result = use_case
            .execute(
                RefineAgentInput::new(single_primary_agent(), "evaluate", 0),
                &params(profile),
            )
            .await;

        assert_eq!(gateway.requests().len(), 1);
        assert_eq!(result.token_usage, TokenUsage::new(900, 300));
        assert!(result.refinement_notes[0].contains("token budget"));
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failed_cycle() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Scripted::Hang]));
        let use_case = RefineAgentUseCase::new(Arc::clone(&gateway));

        let result = use_case
            .execute(
                RefineAgentInput::new(single_primary_agent(), "evaluate", 0),
                &params(DepthProfile::fast()),
            )
            .await;

        assert_eq!(result.details, "Failed to parse");
        assert_eq!(result.internal_iterations, 0);
    }
}
