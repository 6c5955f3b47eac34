//! Prompt templates for the council flow

use crate::agent::{AgentDefinition, ExpertiseBand};
use crate::discussion::{RoundContext, RoundRecord, TeamConcern};
use crate::evaluation::AgentResult;
use crate::pillar::{PillarRegistry, PillarScores};

const FINAL_ROUND_INSTRUCTION: &str =
    "\n\nThis is the FINAL round. Commit to decisive scores; do not raise new open questions.";

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for one agent: role, accountable pillars and output schema.
    pub fn agent_system(agent: &AgentDefinition, registry: &PillarRegistry) -> String {
        let mut prompt = format!(
            "You are the {} on a code review council.\n{}\n\n",
            agent.role, agent.description
        );

        prompt.push_str("Score every pillar below. Your accountability per pillar:\n");
        for pillar in registry.pillars() {
            let rule = pillar.rule();
            let band = match agent.expertise.band(*pillar) {
                ExpertiseBand::Primary => "PRIMARY - justify in depth",
                ExpertiseBand::Secondary => "secondary",
                ExpertiseBand::Tertiary => "tertiary",
            };
            prompt.push_str(&format!(
                "- {} ({}): range {}{} [{}]\n",
                pillar.key(),
                pillar.display_name(),
                rule.describe(),
                if rule.nullable {
                    ", null allowed if it cannot be determined"
                } else {
                    ", must be a number"
                },
                band
            ));
        }

        prompt.push_str(&format!(
            r#"
Respond with a single JSON object and nothing else:
{{
  "summary": "one-paragraph assessment",
  "details": "evidence for each score, citing the change",
  "metrics": {{ {} }},
  "concerns": ["inconsistencies you see in other agents' scores"],
  "addressedConcerns": [{{"fromAgent": "...", "concern": "...", "addressed": true, "explanation": "..."}}],
  "confidenceLevel": 0.0
}}
Never invent a number you cannot support: use null and explain why."#,
            registry
                .keys()
                .iter()
                .map(|k| format!("\"{}\": <number|null>", k))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        prompt
    }

    /// Human prompt for round 0; a single-round evaluation also gets the final-round instruction.
    pub fn initial_prompt(subject: &str, message: Option<&str>, context: &RoundContext) -> String {
        let mut prompt = Self::change_section(subject, message);
        prompt.push_str("\n\nEvaluate this change from your role's perspective.");
        if context.is_final_round {
            prompt.push_str(FINAL_ROUND_INSTRUCTION);
        }
        prompt
    }

    fn change_section(subject: &str, message: Option<&str>) -> String {
        let mut prompt = String::new();
        if let Some(message) = message {
            prompt.push_str(&format!("Commit message:\n{}\n\n", message));
        }
        prompt.push_str(&format!("Change under evaluation:\n```diff\n{}\n```", subject));
        prompt
    }

    /// Human prompt for a discussion round (index >= 1).
    pub fn discussion_prompt(
        agent_name: &str,
        subject: &str,
        message: Option<&str>,
        context: &RoundContext,
    ) -> String {
        let mut prompt = Self::change_section(subject, message);
        prompt.push_str("\n\nEvaluate this change from your role's perspective.");

        prompt.push_str(&format!(
            "\n\n## Round {} - results from the previous round\n",
            context.round_index
        ));
        for result in &context.prior_results {
            prompt.push_str(&Self::render_result(result));
        }

        let concerns = context.concerns_from_others(agent_name);
        if !concerns.is_empty() {
            prompt.push_str("\n## Open concerns\n");
            for concern in concerns {
                prompt.push_str(&format!(
                    "- [{} / round {}] {}\n",
                    concern.agent_name, concern.round, concern.concern
                ));
            }
        }

        prompt.push_str(
            r#"
Instructions:
1. Validate or revise your scores for your PRIMARY pillars in light of the team's results.
2. Raise concerns about inconsistencies you observe in other agents' scores.
3. For each open concern that applies to you, report in "addressedConcerns" whether it was addressed."#,
        );

        if context.is_final_round {
            prompt.push_str(FINAL_ROUND_INSTRUCTION);
        }
        prompt
    }

    /// Human prompt for one self-refinement cycle.
    pub fn refinement_prompt(previous: &AgentResult, questions: &[String]) -> String {
        let mut prompt = String::from("Your previous analysis:\n");
        prompt.push_str(&Self::render_result(previous));
        prompt.push_str("\nAnswer these follow-up questions by improving your analysis:\n");
        for (i, question) in questions.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, question));
        }
        prompt.push_str(
            "\nReturn the complete, revised JSON object (same schema). Keep scores you still stand behind.",
        );
        prompt
    }

    /// System prompt for the synthesis step
    pub fn synthesis_system() -> &'static str {
        r#"You are the moderator of a code review council.
Your task is to consolidate the council's final scores into one assessment:
1. State the consensus position in a short summary
2. Explain the key evidence and where agents disagreed
3. Note how scores evolved between rounds

Respond with a single JSON object: {"summary": "...", "details": "...", "evolutionNotes": ["..."]}"#
    }

    /// Human prompt for the synthesis step
    pub fn synthesis_prompt(
        rounds: &[RoundRecord],
        consensus: &PillarScores,
        unresolved: &[TeamConcern],
    ) -> String {
        let mut prompt = String::new();
        for record in rounds {
            prompt.push_str(&format!("## Round {}\n", record.round));
            for result in &record.results {
                prompt.push_str(&Self::render_result(result));
            }
        }
        prompt.push_str(&format!(
            "\n## Consensus scores\n{}\n",
            consensus.to_compact_string()
        ));
        if !unresolved.is_empty() {
            prompt.push_str("\n## Unresolved concerns\n");
            for concern in unresolved {
                prompt.push_str(&format!("- [{}] {}\n", concern.agent_name, concern.concern));
            }
        }
        prompt
    }

    fn render_result(result: &AgentResult) -> String {
        let name = if result.agent_name.is_empty() {
            "you"
        } else {
            result.agent_name.as_str()
        };
        let mut text = format!(
            "\n--- {} (round {}) ---\nSummary: {}\nDetails: {}\nMetrics: {}\n",
            name,
            result.round,
            result.summary,
            result.details,
            result.metrics.to_compact_string()
        );
        if !result.concerns.is_empty() {
            text.push_str(&format!("Concerns: {}\n", result.concerns.join("; ")));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pillar::{Pillar, PillarValue};

    fn result(agent: &str, summary: &str, details: &str) -> AgentResult {
        AgentResult::new(
            summary,
            details,
            PillarScores::default().with(Pillar::CodeQuality, PillarValue::Scored(7.0)),
        )
        .with_agent(agent)
        .with_round(1)
    }

    #[test]
    fn test_agent_system_lists_every_pillar() {
        let registry = PillarRegistry::standard();
        let agent = &AgentDefinition::default_roster()[4];
        let prompt = PromptTemplate::agent_system(agent, &registry);
        for key in registry.keys() {
            assert!(prompt.contains(key), "missing {}", key);
        }
        assert!(prompt.contains("testCoverage (Test Coverage): range 1-10, must be a number [PRIMARY"));
        assert!(prompt.contains("\"summary\""));
    }

    #[test]
    fn test_discussion_prompt_carries_prior_results_verbatim() {
        let prior = vec![
            result("qa-engineer", "Coverage is thin", "Only one test touches the parser."),
            result("senior-architect", "Structure is fine", "Module boundaries unchanged."),
        ];
        let concerns = vec![
            TeamConcern::new("senior-architect", "Coverage score too generous", 1),
            TeamConcern::new("qa-engineer", "Debt not quantified", 1),
        ];
        let context = RoundContext::discussion(2, true, prior.clone(), concerns);
        let prompt = PromptTemplate::discussion_prompt("qa-engineer", "+fn a() {}", None, &context);

        for r in &prior {
            assert!(prompt.contains(&r.summary));
            assert!(prompt.contains(&r.details));
        }
        assert!(prompt.contains("Coverage score too generous"));
        assert!(!prompt.contains("Debt not quantified"));
        assert!(prompt.contains("FINAL round"));
    }

    #[test]
    fn test_refinement_prompt_numbers_questions() {
        let previous = AgentResult::new("s", "d", PillarScores::default());
        let prompt = PromptTemplate::refinement_prompt(
            &previous,
            &["Why?".to_string(), "How much?".to_string()],
        );
        assert!(prompt.contains("1. Why?"));
        assert!(prompt.contains("2. How much?"));
        assert!(prompt.contains("--- you (round 0) ---"));
    }

    #[test]
    fn test_initial_prompt_includes_message() {
        let prompt =
            PromptTemplate::initial_prompt("+x", Some("Fix parser"), &RoundContext::initial(false));
        assert!(prompt.starts_with("Commit message:\nFix parser"));
        assert!(prompt.contains("```diff\n+x\n```"));
        assert!(!prompt.contains("FINAL round"));
    }

    #[test]
    fn test_single_round_initial_prompt_is_final() {
        let prompt = PromptTemplate::initial_prompt("+x", None, &RoundContext::initial(true));
        assert!(prompt.contains("Change under evaluation"));
        assert!(prompt.ends_with("Commit to decisive scores; do not raise new open questions."));
    }
}
