//! Run Evaluation use case
//!
//! Orchestrates the full council flow:
//!
//! 1. Round 0 (initial): every agent refines its own analysis of the change
//! 2. Rounds 1..N (discussion): every agent sees all prior-round results and
//!    open concerns, revises, raises and acknowledges concerns
//! 3. Aggregation of the final round into consensus scores
//! 4. Optional synthesis: one generation, with a deterministic fallback

use crate::config::EvaluationParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger, event_types,
};
use crate::ports::llm_gateway::{GatewayError, GenerationRequest, LlmGateway};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::retrieval::{RetrievalPort, RetrievalQuery, RetrievalSource};
use crate::use_cases::refine_agent::{RefineAgentInput, RefineAgentUseCase};
use council_domain::{
    AgentDefinition, AgentResult, ChangeSet, ClarityEvaluator, ConcernLedger, ConfigIssue,
    ConfigIssueCode, DomainError, EvaluationReport, FinalSynthesis, PillarAggregator,
    PillarScores, PromptTemplate, QuestionTemplates, RoundContext, RoundRecord, Severity,
    TeamConcern, TokenUsage,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors that can occur during an evaluation
#[derive(Error, Debug)]
pub enum RunEvaluationError {
    #[error("No agents configured")]
    NoAgents,

    #[error("Invalid agent configuration: {0}")]
    InvalidAgents(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Input for the RunEvaluation use case
#[derive(Debug, Clone)]
pub struct RunEvaluationInput {
    pub change: ChangeSet,
    /// Roster in presentation order
    pub agents: Vec<AgentDefinition>,
    pub params: EvaluationParams,
}

impl RunEvaluationInput {
    pub fn new(change: ChangeSet, agents: Vec<AgentDefinition>) -> Self {
        Self {
            change,
            agents,
            params: EvaluationParams::default(),
        }
    }

    pub fn with_params(mut self, params: EvaluationParams) -> Self {
        self.params = params;
        self
    }
}

/// Use case for running a council evaluation
pub struct RunEvaluationUseCase<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    refiner: Arc<RefineAgentUseCase<G>>,
    evaluator: ClarityEvaluator,
    questions: QuestionTemplates,
    retrieval: Option<Arc<dyn RetrievalPort>>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl<G: LlmGateway + 'static> RunEvaluationUseCase<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            refiner: Arc::new(RefineAgentUseCase::new(Arc::clone(&gateway))),
            gateway,
            evaluator: ClarityEvaluator::default(),
            questions: QuestionTemplates::default(),
            retrieval: None,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Rebuild the per-agent refiner from the current settings.
    fn rebuild_refiner(&mut self) {
        self.refiner = Arc::new(
            RefineAgentUseCase::new(Arc::clone(&self.gateway))
                .with_evaluator(self.evaluator.clone())
                .with_question_templates(self.questions.clone())
                .with_conversation_logger(Arc::clone(&self.conversation_logger)),
        );
    }

    /// Configure clarity scoring and self-question generation.
    ///
    /// Retrieval queries use the evaluator's justification keywords.
    pub fn with_refinement(
        mut self,
        evaluator: ClarityEvaluator,
        questions: QuestionTemplates,
    ) -> Self {
        self.evaluator = evaluator;
        self.questions = questions;
        self.rebuild_refiner();
        self
    }

    pub fn with_retrieval(mut self, retrieval: Arc<dyn RetrievalPort>) -> Self {
        self.retrieval = Some(retrieval);
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self.rebuild_refiner();
        self
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        input: RunEvaluationInput,
    ) -> Result<EvaluationReport, RunEvaluationError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: RunEvaluationInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<EvaluationReport, RunEvaluationError> {
        self.validate_roster(&input.agents)?;

        let RunEvaluationInput {
            change,
            agents,
            params,
        } = input;
        let final_round = params.final_round();

        info!(
            "Starting evaluation with {} agents, {} round(s), {} byte diff",
            agents.len(),
            final_round + 1,
            change.len()
        );
        self.conversation_logger.log(ConversationEvent::new(
            event_types::EVALUATION_STARTED,
            json!({
                "agents": agents.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
                "rounds": final_round + 1,
                "diff_bytes": change.len(),
                "files": change.touched_files(),
                "depth": params.depth,
            }),
        ));

        let subjects = self.prepare_subjects(&change, &agents, &params).await;

        let mut ledger = ConcernLedger::new();
        let mut rounds: Vec<RoundRecord> = Vec::with_capacity(final_round + 1);

        for round in 0..=final_round {
            let is_final = round == final_round;
            let context = match rounds.last() {
                None => RoundContext::initial(is_final),
                Some(previous) => RoundContext::discussion(
                    round,
                    is_final,
                    previous.results.clone(),
                    ledger.open(),
                ),
            };

            info!(
                "Round {}{}",
                round,
                if is_final { " (final)" } else { "" }
            );
            progress.on_round_start(round, agents.len(), is_final);

            let inputs: Vec<RefineAgentInput> = agents
                .iter()
                .zip(&subjects)
                .map(|(agent, subject)| {
                    let prompt = if context.is_initial() {
                        PromptTemplate::initial_prompt(subject, change.message(), &context)
                    } else {
                        PromptTemplate::discussion_prompt(
                            &agent.name,
                            subject,
                            change.message(),
                            &context,
                        )
                    };
                    RefineAgentInput::new(agent.clone(), prompt, round)
                })
                .collect();

            let results = if params.concurrent {
                self.run_round_concurrent(inputs, &params, progress).await
            } else {
                self.run_round_sequential(inputs, &params, progress).await
            };

            ledger.record_round(round, &results);
            let record = RoundRecord::new(round, results);
            self.conversation_logger.log(ConversationEvent::new(
                event_types::ROUND_COMPLETED,
                json!({
                    "round": round,
                    "is_final": is_final,
                    "results": record.results,
                    "open_concerns": ledger.open().len(),
                }),
            ));
            progress.on_round_complete(round);
            rounds.push(record);
        }

        let aggregator = PillarAggregator::new(self.evaluator.registry().clone());
        let final_results = rounds.last().map(|r| r.results.as_slice()).unwrap_or(&[]);
        let consensus = aggregator.aggregate(final_results, &agents);
        let unresolved = ledger.open();

        let mut token_usage: TokenUsage = rounds.iter().map(|r| r.token_usage()).sum();

        let final_synthesis = if params.synthesize {
            progress.on_synthesis_start();
            let (synthesis, usage, generated) = self
                .synthesize(&rounds, consensus.clone(), unresolved.clone(), &params)
                .await;
            token_usage += usage;
            progress.on_synthesis_complete(generated);
            Some(synthesis)
        } else {
            debug!("Skipping synthesis");
            None
        };

        let report = EvaluationReport {
            agents: agents.iter().map(|a| a.name.clone()).collect(),
            rounds,
            consensus_metrics: consensus,
            final_synthesis,
            unresolved_concerns: unresolved,
            token_usage,
        };

        self.conversation_logger.log(ConversationEvent::new(
            event_types::EVALUATION_COMPLETED,
            json!({
                "consensus": report.consensus_metrics,
                "unresolved_concerns": report.unresolved_concerns.len(),
                "token_usage": report.token_usage,
            }),
        ));
        info!(
            "Evaluation complete: {} ({} tokens)",
            report.consensus_metrics.to_compact_string(),
            report.token_usage.total
        );

        Ok(report)
    }

    fn validate_roster(&self, agents: &[AgentDefinition]) -> Result<(), RunEvaluationError> {
        if agents.is_empty() {
            return Err(RunEvaluationError::NoAgents);
        }

        let mut issues: Vec<ConfigIssue> = agents
            .iter()
            .flat_map(|a| a.validate(self.evaluator.registry()))
            .collect();
        let mut seen = HashSet::new();
        for agent in agents {
            if !seen.insert(agent.name.as_str()) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::DuplicateAgent {
                        agent: agent.name.clone(),
                    },
                    format!("agent '{}' is defined more than once", agent.name),
                ));
            }
        }

        for issue in &issues {
            warn!("{}", issue);
        }
        if ConfigIssue::has_errors(&issues) {
            let messages: Vec<String> = issues
                .iter()
                .filter(|i| i.severity == Severity::Error)
                .map(|i| i.message.clone())
                .collect();
            return Err(RunEvaluationError::InvalidAgents(messages.join("; ")));
        }
        Ok(())
    }

    /// What each agent reads as "the change": the raw diff, or retrieved
    /// excerpts when the diff is large and a retrieval backend is configured.
    async fn prepare_subjects(
        &self,
        change: &ChangeSet,
        agents: &[AgentDefinition],
        params: &EvaluationParams,
    ) -> Vec<String> {
        let raw = || vec![change.diff().to_string(); agents.len()];

        let Some(retrieval) = &self.retrieval else {
            return raw();
        };
        if change.len() <= params.large_diff_threshold {
            debug!(
                "Diff is {} bytes (threshold {}), sending it whole",
                change.len(),
                params.large_diff_threshold
            );
            return raw();
        }

        let mut subjects = Vec::with_capacity(agents.len());
        for agent in agents {
            let queries = self.retrieval_queries(agent, params);
            let subject = match retrieval.retrieve(change, &queries).await {
                Ok(results) => {
                    let mut excerpts: Vec<&str> = Vec::new();
                    for text in results.iter().map(|r| r.results_text.trim()) {
                        if !text.is_empty() && !excerpts.contains(&text) {
                            excerpts.push(text);
                        }
                    }
                    self.conversation_logger.log(ConversationEvent::new(
                        event_types::RETRIEVAL,
                        json!({
                            "agent": agent.name,
                            "queries": queries,
                            "excerpts": excerpts.len(),
                        }),
                    ));
                    if excerpts.is_empty() {
                        warn!("Retrieval returned nothing for {}, using raw diff", agent.name);
                        change.diff().to_string()
                    } else {
                        excerpts.join("\n\n")
                    }
                }
                Err(e) => {
                    warn!("Retrieval failed for {}: {}; using raw diff", agent.name, e);
                    change.diff().to_string()
                }
            };
            subjects.push(subject);
        }
        subjects
    }

    /// One query per primary pillar (all pillars if the agent has none).
    fn retrieval_queries(
        &self,
        agent: &AgentDefinition,
        params: &EvaluationParams,
    ) -> Vec<RetrievalQuery> {
        let registry = self.evaluator.registry();
        let mut pillars = agent.expertise.primary_pillars(registry);
        if pillars.is_empty() {
            pillars = registry.pillars().to_vec();
        }

        let mut queries = Vec::new();
        for pillar in pillars {
            let text = format!(
                "{} {}",
                pillar.display_name(),
                self.evaluator.keywords().keywords(pillar).join(" ")
            );
            queries.push(RetrievalQuery::new(
                text.clone(),
                params.retrieval_top_k,
                RetrievalSource::Diff,
            ));
            if params.retrieve_docs {
                queries.push(RetrievalQuery::new(
                    text,
                    params.retrieval_top_k,
                    RetrievalSource::Docs,
                ));
            }
        }
        queries
    }

    async fn run_round_sequential(
        &self,
        inputs: Vec<RefineAgentInput>,
        params: &EvaluationParams,
        progress: &dyn ProgressNotifier,
    ) -> Vec<AgentResult> {
        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let round = input.round;
            let result = self.refiner.execute(input, params).await;
            progress.on_agent_complete(
                round,
                &result.agent_name,
                result.clarity_score,
                !result.summary.is_empty(),
            );
            results.push(result);
        }
        results
    }

    /// Run all agents of a round in parallel; results come back in roster order.
    async fn run_round_concurrent(
        &self,
        inputs: Vec<RefineAgentInput>,
        params: &EvaluationParams,
        progress: &dyn ProgressNotifier,
    ) -> Vec<AgentResult> {
        let mut join_set = JoinSet::new();
        let fallbacks: Vec<(String, usize)> = inputs
            .iter()
            .map(|i| (i.agent.name.clone(), i.round))
            .collect();

        for (index, input) in inputs.into_iter().enumerate() {
            let refiner = Arc::clone(&self.refiner);
            let params = params.clone();
            join_set.spawn(async move { (index, refiner.execute(input, &params).await) });
        }

        let mut slots: Vec<Option<AgentResult>> = vec![None; fallbacks.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => {
                    progress.on_agent_complete(
                        result.round,
                        &result.agent_name,
                        result.clarity_score,
                        !result.summary.is_empty(),
                    );
                    slots[index] = Some(result);
                }
                Err(e) => {
                    warn!("Task join error: {}", e);
                }
            }
        }

        slots
            .into_iter()
            .zip(fallbacks)
            .map(|(slot, (name, round))| {
                slot.unwrap_or_else(|| {
                    progress.on_agent_complete(round, &name, 0.0, false);
                    self.refiner
                        .interpreter()
                        .fallback("")
                        .with_agent(name)
                        .with_round(round)
                })
            })
            .collect()
    }

    /// Returns the synthesis, its token usage, and whether it was generated.
    async fn synthesize(
        &self,
        rounds: &[RoundRecord],
        consensus: PillarScores,
        unresolved: Vec<TeamConcern>,
        params: &EvaluationParams,
    ) -> (FinalSynthesis, TokenUsage, bool) {
        info!("Synthesis");
        let request = GenerationRequest::new(
            PromptTemplate::synthesis_system(),
            PromptTemplate::synthesis_prompt(rounds, &consensus, &unresolved),
            params.max_output_tokens,
        );

        let outcome = match params.generation_timeout {
            Some(limit) => tokio::time::timeout(limit, self.gateway.generate(&request))
                .await
                .unwrap_or(Err(GatewayError::Timeout)),
            None => self.gateway.generate(&request).await,
        };

        let (generated, usage) = match outcome {
            Ok(response) => {
                let usage = response
                    .usage
                    .as_ref()
                    .map(TokenUsage::from_usage_value)
                    .unwrap_or_default();
                let synthesis = FinalSynthesis::from_generation(
                    &response.content,
                    consensus.clone(),
                    unresolved.clone(),
                    rounds,
                );
                if synthesis.is_none() {
                    warn!("Synthesis output unusable, building it from the consensus scores");
                }
                (synthesis, usage)
            }
            Err(e) => {
                warn!("Synthesis generation failed: {}", e);
                (None, TokenUsage::default())
            }
        };

        let was_generated = generated.is_some();
        let synthesis = generated
            .unwrap_or_else(|| FinalSynthesis::deterministic(consensus, unresolved, rounds));
        self.conversation_logger.log(ConversationEvent::new(
            event_types::SYNTHESIS,
            json!({
                "generated": was_generated,
                "synthesis": synthesis,
            }),
        ));
        (synthesis, usage, was_generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::GenerationResponse;
    use crate::ports::retrieval::{RetrievalError, RetrievalResult};
    use async_trait::async_trait;
    use council_domain::{
        AddressedConcern, ClarityThresholds, DepthProfile, ExpertiseProfile, JustificationKeywords,
        Pillar, PillarRegistry, PillarValue,
    };
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const DIFF: &str = "diff --git a/src/export.rs b/src/export.rs\n--- a/src/export.rs\n+++ b/src/export.rs\n@@ -1,2 +1,3 @@\n fn export() {\n+    write_csv();\n }\n";

    // ==================== Test Mocks ====================

    /// Mock gateway that answers each request from a queue, recording prompts
    struct ScriptedGateway {
        responses: Mutex<VecDeque<String>>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedGateway {
        fn new(responses: Vec<String>) -> Self {
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
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .map(|content| {
                    GenerationResponse::new(content)
                        .with_usage(json!({"input_tokens": 100, "output_tokens": 50}))
                })
                .ok_or_else(|| GatewayError::Other("No more responses".to_string()))
        }
    }

    /// Gateway that answers every request with a justified result naming its role
    struct EchoGateway;

    #[async_trait]
    impl LlmGateway for EchoGateway {
        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationResponse, GatewayError> {
            let role = request
                .system_instructions
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();
            Ok(GenerationResponse::new(response(&role, 6.0, &[], &[])))
        }
    }

    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ProgressNotifier for RecordingProgress {
        fn on_round_start(&self, round: usize, total_agents: usize, is_final: bool) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start {} {} {}", round, total_agents, is_final));
        }

        fn on_agent_complete(&self, round: usize, agent: &str, _clarity: f64, success: bool) {
            self.events
                .lock()
                .unwrap()
                .push(format!("agent {} {} {}", round, agent, success));
        }

        fn on_round_complete(&self, round: usize) {
            self.events.lock().unwrap().push(format!("end {}", round));
        }
    }

    struct FixedRetrieval {
        result: Result<String, String>,
        calls: Mutex<usize>,
        queries: Mutex<Vec<String>>,
    }

    impl FixedRetrieval {
        fn new(result: Result<String, String>) -> Self {
            Self {
                result,
                calls: Mutex::new(0),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RetrievalPort for FixedRetrieval {
        async fn retrieve(
            &self,
            _change: &ChangeSet,
            queries: &[RetrievalQuery],
        ) -> Result<Vec<RetrievalResult>, RetrievalError> {
            *self.calls.lock().unwrap() += 1;
            self.queries
                .lock()
                .unwrap()
                .extend(queries.iter().map(|q| q.query.clone()));
            match &self.result {
                Ok(text) => Ok(queries
                    .iter()
                    .map(|_| RetrievalResult {
                        results_text: text.clone(),
                    })
                    .collect()),
                Err(e) => Err(RetrievalError::Failed(e.clone())),
            }
        }
    }

    /// Fully justified result for every pillar.
    fn response(
        summary: &str,
        score: f64,
        concerns: &[&str],
        addressed: &[AddressedConcern],
    ) -> String {
        json!({
            "summary": summary,
            "details": "Users gain an export feature. Estimate 2 hours of effort. Tests cover it. \
                        Readability is fine. Complexity is low. The author spent 3 hours. No debt added.",
            "metrics": {
                "functionalImpact": score,
                "idealTimeHours": 2,
                "testCoverage": score,
                "codeQuality": score,
                "codeComplexity": 3,
                "actualTimeHours": 3,
                "technicalDebtHours": 0
            },
            "concerns": concerns,
            "addressedConcerns": addressed,
        })
        .to_string()
    }

    fn roster() -> Vec<AgentDefinition> {
        vec![
            AgentDefinition::new(
                "qa-engineer",
                "QA Engineer",
                "Tests.",
                ExpertiseProfile::new([(Pillar::TestCoverage, 0.6), (Pillar::CodeQuality, 0.2)])
                    .unwrap(),
            ),
            AgentDefinition::new(
                "developer-reviewer",
                "Developer (Reviewer)",
                "Code.",
                ExpertiseProfile::new([(Pillar::CodeQuality, 0.6), (Pillar::TestCoverage, 0.2)])
                    .unwrap(),
            ),
        ]
    }

    fn sequential(rounds: usize) -> EvaluationParams {
        EvaluationParams::default()
            .with_depth(DepthProfile::fast())
            .with_rounds(rounds)
            .with_concurrent(false)
            .with_synthesis(false)
    }

    fn change() -> ChangeSet {
        ChangeSet::new(DIFF).unwrap().with_message("Add CSV export")
    }

    // ==================== Protocol Tests ====================

    #[tokio::test]
    async fn test_round_two_context_contains_round_one_results() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            response("qa round 0", 5.0, &[], &[]),
            response("reviewer round 0", 7.0, &[], &[]),
            response("qa round 1", 5.5, &["Quality score too generous"], &[]),
            response("reviewer round 1", 7.0, &[], &[]),
            response("qa round 2", 6.0, &[], &[]),
            response("reviewer round 2", 6.5, &[], &[]),
        ]));
        let use_case = RunEvaluationUseCase::new(Arc::clone(&gateway));

        let report = use_case
            .execute(RunEvaluationInput::new(change(), roster()).with_params(sequential(3)))
            .await
            .unwrap();

        assert_eq!(report.rounds.len(), 3);
        let requests = gateway.requests();
        assert_eq!(requests.len(), 6);

        let round_one = &report.rounds[1].results;
        for request in &requests[4..6] {
            for result in round_one {
                assert!(request.human_prompt.contains(&result.summary));
                assert!(request.human_prompt.contains(&result.details));
                assert!(request.human_prompt.contains(&result.metrics.to_compact_string()));
            }
            assert!(request.human_prompt.contains("FINAL round"));
        }
        for request in &requests[..4] {
            assert!(!request.human_prompt.contains("FINAL round"));
        }
        // Reviewer sees the QA concern, QA does not see its own
        assert!(requests[5].human_prompt.contains("Quality score too generous"));
        assert!(!requests[4].human_prompt.contains("Open concerns"));

        for result in &report.rounds[2].results {
            assert_eq!(result.round, 2);
        }
        assert_eq!(report.rounds[2].results[0].summary, "qa round 2");
    }

    #[tokio::test]
    async fn test_initial_round_has_no_team_context() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            response("a", 5.0, &[], &[]),
            response("b", 5.0, &[], &[]),
        ]));
        let use_case = RunEvaluationUseCase::new(Arc::clone(&gateway));

        let report = use_case
            .execute(RunEvaluationInput::new(change(), roster()).with_params(sequential(1)))
            .await
            .unwrap();

        assert_eq!(report.rounds.len(), 1);
        let requests = gateway.requests();
        assert!(requests[0].human_prompt.contains("Add CSV export"));
        assert!(requests[0].human_prompt.contains("write_csv"));
        assert!(!requests[0].human_prompt.contains("previous round"));
        // Single round is also the final round
        assert!(requests[0].human_prompt.contains("FINAL round"));
        assert!(requests[0].human_prompt.contains("Commit to decisive scores"));
        assert!(requests[0].system_instructions.contains("QA Engineer"));
    }

    #[tokio::test]
    async fn test_consensus_and_concerns() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            response("qa 0", 4.0, &["Coverage claim is unverified"], &[]),
            response("rev 0", 8.0, &["Naming inconsistent"], &[]),
            response(
                "qa 1",
                4.0,
                &[],
                &[AddressedConcern::new("developer-reviewer", "naming inconsistent", true)],
            ),
            response("rev 1", 8.0, &[], &[]),
        ]));
        let use_case = RunEvaluationUseCase::new(Arc::clone(&gateway));

        let report = use_case
            .execute(RunEvaluationInput::new(change(), roster()).with_params(sequential(2)))
            .await
            .unwrap();

        assert_eq!(report.unresolved_concerns.len(), 1);
        assert_eq!(report.unresolved_concerns[0].agent_name, "qa-engineer");

        // testCoverage: (0.6*4 + 0.2*8) / 0.8 = 5.0
        let coverage = report
            .consensus_metrics
            .get(Pillar::TestCoverage)
            .as_score()
            .unwrap();
        assert!((coverage - 5.0).abs() < 1e-9);
        // No agent weights functionalImpact
        assert_eq!(
            report.consensus_metrics.get(Pillar::FunctionalImpact),
            PillarValue::Unknown
        );
        assert_eq!(report.token_usage, TokenUsage::new(400, 200));
        assert!(report.final_synthesis.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_round_keeps_roster_order() {
        let use_case = RunEvaluationUseCase::new(Arc::new(EchoGateway));
        let progress = RecordingProgress {
            events: Mutex::new(Vec::new()),
        };

        let report = use_case
            .execute_with_progress(
                RunEvaluationInput::new(change(), roster()).with_params(
                    sequential(2).with_concurrent(true),
                ),
                &progress,
            )
            .await
            .unwrap();

        for record in &report.rounds {
            assert_eq!(record.results[0].agent_name, "qa-engineer");
            assert_eq!(record.results[1].agent_name, "developer-reviewer");
            assert!(record.results[0].summary.contains("QA Engineer"));
        }

        let events = progress.events.lock().unwrap();
        assert_eq!(events.first().unwrap(), "start 0 2 false");
        assert!(events.contains(&"start 1 2 true".to_string()));
        assert_eq!(events.last().unwrap(), "end 1");
        assert_eq!(events.iter().filter(|e| e.starts_with("agent")).count(), 4);
    }

    // ==================== Synthesis Tests ====================

    #[tokio::test]
    async fn test_generated_synthesis() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            response("a", 5.0, &[], &[]),
            response("b", 7.0, &[], &[]),
            r#"{"summary":"Council agrees on a solid change","details":"Minor coverage gaps."}"#
                .to_string(),
        ]));
        let use_case = RunEvaluationUseCase::new(Arc::clone(&gateway));

        let report = use_case
            .execute(
                RunEvaluationInput::new(change(), roster())
                    .with_params(sequential(1).with_synthesis(true)),
            )
            .await
            .unwrap();

        let synthesis = report.final_synthesis.unwrap();
        assert_eq!(synthesis.summary, "Council agrees on a solid change");
        assert_eq!(synthesis.metrics, report.consensus_metrics);
        assert_eq!(gateway.requests().len(), 3);
        assert_eq!(report.token_usage.total, 450);
    }

    #[tokio::test]
    async fn test_unusable_synthesis_falls_back() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            response("a", 5.0, &[], &[]),
            response("b", 7.0, &[], &[]),
            "I cannot produce JSON today.".to_string(),
        ]));
        let use_case = RunEvaluationUseCase::new(Arc::clone(&gateway));

        let report = use_case
            .execute(
                RunEvaluationInput::new(change(), roster())
                    .with_params(sequential(1).with_synthesis(true)),
            )
            .await
            .unwrap();

        let synthesis = report.final_synthesis.unwrap();
        assert!(synthesis.summary.starts_with("2 agent(s) converged over 1 round(s)"));
    }

    // ==================== Configuration Tests ====================

    #[tokio::test]
    async fn test_empty_roster_is_error() {
        let use_case = RunEvaluationUseCase::new(Arc::new(EchoGateway));
        let err = use_case
            .execute(RunEvaluationInput::new(change(), Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, RunEvaluationError::NoAgents));
    }

    #[tokio::test]
    async fn test_duplicate_agent_is_error() {
        let mut agents = roster();
        agents.push(agents[0].clone());
        let use_case = RunEvaluationUseCase::new(Arc::new(EchoGateway));
        let err = use_case
            .execute(RunEvaluationInput::new(change(), agents))
            .await
            .unwrap_err();
        assert!(matches!(err, RunEvaluationError::InvalidAgents(_)));
    }

    // ==================== Retrieval Tests ====================

    #[tokio::test]
    async fn test_large_diff_uses_retrieved_excerpts() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            response("a", 5.0, &[], &[]),
            response("b", 5.0, &[], &[]),
        ]));
        let retrieval = Arc::new(FixedRetrieval::new(Ok(
            "@@ excerpt: tests for export @@".to_string(),
        )));
        let use_case = RunEvaluationUseCase::new(Arc::clone(&gateway))
            .with_retrieval(Arc::clone(&retrieval) as Arc<dyn RetrievalPort>);

        use_case
            .execute(
                RunEvaluationInput::new(change(), roster())
                    .with_params(sequential(1).with_large_diff_threshold(10)),
            )
            .await
            .unwrap();

        assert_eq!(*retrieval.calls.lock().unwrap(), 2);
        let requests = gateway.requests();
        assert!(requests[0].human_prompt.contains("excerpt: tests for export"));
        assert!(!requests[0].human_prompt.contains("write_csv"));
    }

    #[tokio::test]
    async fn test_repeated_excerpts_appear_once() {
        let gateway = Arc::new(ScriptedGateway::new(vec![response("a", 5.0, &[], &[])]));
        let retrieval = Arc::new(FixedRetrieval::new(Ok("@@ shared hunk @@".to_string())));
        let use_case = RunEvaluationUseCase::new(Arc::clone(&gateway))
            .with_retrieval(Arc::clone(&retrieval) as Arc<dyn RetrievalPort>);
        let generalist = AgentDefinition::new(
            "generalist",
            "Generalist",
            "Everything.",
            ExpertiseProfile::new([(Pillar::TestCoverage, 0.5), (Pillar::CodeQuality, 0.5)])
                .unwrap(),
        );

        use_case
            .execute(
                RunEvaluationInput::new(change(), vec![generalist])
                    .with_params(sequential(1).with_large_diff_threshold(10)),
            )
            .await
            .unwrap();

        let prompt = &gateway.requests()[0].human_prompt;
        assert_eq!(prompt.matches("@@ shared hunk @@").count(), 1);
    }

    #[tokio::test]
    async fn test_retrieval_queries_use_evaluator_keywords() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            response("a", 5.0, &[], &[]),
            response("b", 5.0, &[], &[]),
        ]));
        let retrieval = Arc::new(FixedRetrieval::new(Ok("@@ hunk @@".to_string())));
        let evaluator = ClarityEvaluator::new(
            PillarRegistry::standard(),
            JustificationKeywords::empty()
                .with(Pillar::TestCoverage, &["fixture"])
                .with(Pillar::CodeQuality, &["lint"]),
            ClarityThresholds::default(),
        );
        let use_case = RunEvaluationUseCase::new(Arc::clone(&gateway))
            .with_refinement(evaluator, QuestionTemplates::default())
            .with_retrieval(Arc::clone(&retrieval) as Arc<dyn RetrievalPort>);

        use_case
            .execute(
                RunEvaluationInput::new(change(), roster())
                    .with_params(sequential(1).with_large_diff_threshold(10)),
            )
            .await
            .unwrap();

        let queries = retrieval.queries.lock().unwrap().clone();
        assert_eq!(
            queries,
            vec!["Test Coverage fixture".to_string(), "Code Quality lint".to_string()]
        );
    }

    #[tokio::test]
    async fn test_retrieval_failure_falls_back_to_raw_diff() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            response("a", 5.0, &[], &[]),
            response("b", 5.0, &[], &[]),
        ]));
        let retrieval = Arc::new(FixedRetrieval::new(Err("index offline".to_string())));
        let use_case = RunEvaluationUseCase::new(Arc::clone(&gateway))
            .with_retrieval(retrieval as Arc<dyn RetrievalPort>);

        use_case
            .execute(
                RunEvaluationInput::new(change(), roster())
                    .with_params(sequential(1).with_large_diff_threshold(10)),
            )
            .await
            .unwrap();

        assert!(gateway.requests()[0].human_prompt.contains("write_csv"));
    }

    #[tokio::test]
    async fn test_small_diff_skips_retrieval() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            response("a", 5.0, &[], &[]),
            response("b", 5.0, &[], &[]),
        ]));
        let retrieval = Arc::new(FixedRetrieval::new(Ok("unused".to_string())));
        let use_case = RunEvaluationUseCase::new(Arc::clone(&gateway))
            .with_retrieval(Arc::clone(&retrieval) as Arc<dyn RetrievalPort>);

        use_case
            .execute(RunEvaluationInput::new(change(), roster()).with_params(sequential(1)))
            .await
            .unwrap();

        assert_eq!(*retrieval.calls.lock().unwrap(), 0);
    }
}
