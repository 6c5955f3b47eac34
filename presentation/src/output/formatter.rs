//! Output formatter trait

use council_domain::{EvaluationReport, OutputFormat};

/// Trait for formatting evaluation reports
pub trait OutputFormatter {
    /// Every round and agent, then consensus and synthesis
    fn format(&self, report: &EvaluationReport) -> String;

    /// Format as JSON
    fn format_json(&self, report: &EvaluationReport) -> String;

    /// Consensus and synthesis only (concise output)
    fn format_summary(&self, report: &EvaluationReport) -> String;

    fn render(&self, report: &EvaluationReport, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format(report),
            OutputFormat::Summary => self.format_summary(report),
            OutputFormat::Json => self.format_json(report),
        }
    }
}
