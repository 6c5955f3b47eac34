//! Progress reporting for council evaluations

use colored::Colorize;
use council_application::ports::progress::ProgressNotifier;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

fn round_title(round: usize, is_final: bool) -> String {
    match (round, is_final) {
        (0, _) => "Round 0: Initial Analysis".to_string(),
        (r, true) => format!("Round {}: Final Discussion", r),
        (r, false) => format!("Round {}: Discussion", r),
    }
}

fn agent_status(agent: &str, clarity: f64, success: bool) -> String {
    if success {
        format!("{} {} ({:.0}%)", "v".green(), agent, clarity)
    } else {
        format!("{} {} (failed)", "x".red(), agent)
    }
}

/// Reports progress with one indicatif bar per round
pub struct ProgressReporter {
    multi: MultiProgress,
    round_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            round_bar: Mutex::new(None),
        }
    }

    fn round_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_round_start(&self, round: usize, total_agents: usize, is_final: bool) {
        let pb = self.multi.add(ProgressBar::new(total_agents as u64));
        pb.set_style(Self::round_style());
        pb.set_prefix(round_title(round, is_final));
        pb.set_message("Refining...");

        if let Ok(mut bar) = self.round_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_agent_complete(&self, _round: usize, agent: &str, clarity: f64, success: bool) {
        if let Ok(bar) = self.round_bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            pb.set_message(agent_status(agent, clarity, success));
            pb.inc(1);
        }
    }

    fn on_round_complete(&self, round: usize) {
        if let Ok(mut bar) = self.round_bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.finish_with_message(format!("Round {} complete!", round).green().to_string());
        }
    }

    fn on_synthesis_start(&self) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::spinner_style());
        pb.set_prefix("Synthesis");
        pb.set_message("Consolidating...");
        pb.enable_steady_tick(std::time::Duration::from_millis(120));

        if let Ok(mut bar) = self.round_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_synthesis_complete(&self, generated: bool) {
        if let Ok(mut bar) = self.round_bar.lock()
            && let Some(pb) = bar.take()
        {
            let message = if generated {
                "done".green().to_string()
            } else {
                "built from consensus scores".yellow().to_string()
            };
            pb.finish_with_message(message);
        }
    }
}

/// Plain line-based progress (no fancy UI), written to stderr
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_round_start(&self, round: usize, total_agents: usize, is_final: bool) {
        eprintln!(
            "{} {} ({} agents)",
            "->".cyan(),
            round_title(round, is_final).bold(),
            total_agents
        );
    }

    fn on_agent_complete(&self, _round: usize, agent: &str, clarity: f64, success: bool) {
        eprintln!("  {}", agent_status(agent, clarity, success));
    }

    fn on_round_complete(&self, _round: usize) {
        eprintln!();
    }

    fn on_synthesis_start(&self) {
        eprintln!("{} {}", "->".cyan(), "Synthesis".bold());
    }
}
