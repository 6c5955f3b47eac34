//! Console output formatter for evaluation reports

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use council_domain::{AgentResult, EvaluationReport, PillarScores, PillarValue};

/// Formats evaluation reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete report
    pub fn format(report: &EvaluationReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Pillar Council Evaluation"));
        output.push('\n');
        output.push_str(&format!(
            "{} {}\n",
            "Agents:".cyan().bold(),
            report.agents.join(", ")
        ));

        for record in &report.rounds {
            let title = if record.round == 0 {
                "Round 0: Initial Analysis".to_string()
            } else {
                format!("Round {}: Discussion", record.round)
            };
            output.push_str(&Self::section_header(&title));
            for result in &record.results {
                output.push_str(&Self::agent_block(result));
            }
        }

        output.push_str(&Self::consensus_section(report));
        output.push_str(&Self::synthesis_section(report));
        output.push_str(&Self::usage_line(report));
        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(report: &EvaluationReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    /// Consensus and synthesis only
    pub fn format_summary(report: &EvaluationReport) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}\n",
            "=== Pillar Council Consensus ===".cyan().bold()
        ));
        output.push_str(&format!(
            "{} {} over {} round(s)\n",
            "Agents consulted:".dimmed(),
            report.agents.join(", "),
            report.rounds.len()
        ));
        output.push_str(&Self::consensus_section(report));
        output.push_str(&Self::synthesis_section(report));
        output.push_str(&Self::usage_line(report));
        output
    }

    fn agent_block(result: &AgentResult) -> String {
        let heading = format!(
            "── {} (clarity {:.0}%, {} refinement(s)) ──",
            result.agent_name, result.clarity_score, result.internal_iterations
        );
        let heading = if result.summary.is_empty() {
            heading.red().bold()
        } else {
            heading.yellow().bold()
        };

        let mut block = format!("\n{}\n", heading);
        if result.summary.is_empty() {
            block.push_str(&format!("{}\n", "No usable analysis".red()));
        } else {
            block.push_str(&format!("{}\n", result.summary));
        }
        block.push_str(&Self::scores_table(&result.metrics));

        if !result.concerns.is_empty() {
            block.push_str(&format!("{}\n", "Concerns:".yellow()));
            for concern in &result.concerns {
                block.push_str(&format!("  * {}\n", concern));
            }
        }
        if !result.missing_information.is_empty() {
            block.push_str(&format!("{}\n", "Missing information:".dimmed()));
            for gap in &result.missing_information {
                block.push_str(&format!("  - {}\n", gap));
            }
        }
        block
    }

    fn scores_table(scores: &PillarScores) -> String {
        scores
            .iter()
            .map(|(pillar, value)| {
                let shown = match value {
                    PillarValue::Scored(v) => format!("{:>6.1}", v).normal(),
                    PillarValue::Unknown => format!("{:>6}", "?").yellow(),
                    PillarValue::Absent => format!("{:>6}", "-").dimmed(),
                };
                format!("  {:<22} {}\n", pillar.display_name(), shown)
            })
            .collect()
    }

    fn consensus_section(report: &EvaluationReport) -> String {
        let mut section = Self::section_header("Consensus Scores");
        section.push_str(&Self::scores_table(&report.consensus_metrics));
        section.push_str(&format!(
            "  {:<22} {:>5.0}%\n",
            "Final clarity".dimmed(),
            report.final_clarity()
        ));
        section
    }

    fn synthesis_section(report: &EvaluationReport) -> String {
        let mut section = String::new();
        if let Some(synthesis) = &report.final_synthesis {
            section.push_str(&Self::section_header("Synthesis"));
            section.push_str(&format!("\n{}\n", synthesis.summary.bold()));
            if !synthesis.details.is_empty() {
                section.push_str(&format!("\n{}\n", synthesis.details));
            }
            if synthesis.evolution_lines().next().is_some() {
                section.push_str(&format!("\n{}\n", "Score evolution:".cyan().bold()));
                for note in synthesis.evolution_lines() {
                    section.push_str(&format!("  * {}\n", note));
                }
            }
        }

        if !report.unresolved_concerns.is_empty() {
            section.push_str(&format!("\n{}\n", "Unresolved concerns:".yellow().bold()));
            for concern in &report.unresolved_concerns {
                section.push_str(&format!("  * {}\n", concern));
            }
        }
        section
    }

    fn usage_line(report: &EvaluationReport) -> String {
        let usage = report.token_usage;
        format!(
            "\n{}\n",
            format!(
                "Tokens: {} in / {} out ({} total)",
                usage.input, usage.output, usage.total
            )
            .dimmed()
        )
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, report: &EvaluationReport) -> String {
        Self::format(report)
    }

    fn format_json(&self, report: &EvaluationReport) -> String {
        Self::format_json(report)
    }

    fn format_summary(&self, report: &EvaluationReport) -> String {
        Self::format_summary(report)
    }
}
