//! CLI command definitions

use clap::{Parser, ValueEnum};
use council_domain::DepthMode;
use std::path::PathBuf;

/// Output format for evaluation reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every round and agent, then consensus and synthesis
    Full,
    /// Consensus scores and synthesis only
    Summary,
    /// The report as JSON
    Json,
}

impl From<OutputFormat> for council_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => council_domain::OutputFormat::Full,
            OutputFormat::Summary => council_domain::OutputFormat::Summary,
            OutputFormat::Json => council_domain::OutputFormat::Json,
        }
    }
}

/// Refinement depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DepthArg {
    Fast,
    Normal,
    Deep,
}

impl From<DepthArg> for DepthMode {
    fn from(depth: DepthArg) -> Self {
        match depth {
            DepthArg::Fast => DepthMode::Fast,
            DepthArg::Normal => DepthMode::Normal,
            DepthArg::Deep => DepthMode::Deep,
        }
    }
}

/// CLI arguments for pillar-council
#[derive(Parser, Debug)]
#[command(name = "pillar-council")]
#[command(author, version, about = "Score a code change with a council of reviewing agents")]
#[command(long_about = r#"
pillar-council scores a code change along seven pillars (functional impact,
ideal time, test coverage, code quality, complexity, actual time, technical
debt) using several agents with different expertise.

Each agent refines its own analysis until it is clear enough, then the agents
discuss over several rounds and converge on consensus scores.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./council.toml      Project-level config
3. ~/.config/pillar-council/config.toml   Global config

Example:
  git diff HEAD~1 | pillar-council - --message "Add CSV export"
  pillar-council change.diff --depth deep --rounds 2 --output json
  pillar-council change.diff --agent qa-engineer --agent senior-architect
"#)]
pub struct Cli {
    /// Diff file to evaluate (`-` reads standard input)
    #[arg(value_name = "DIFF")]
    pub diff: Option<PathBuf>,

    /// Commit message accompanying the change
    #[arg(short, long, value_name = "TEXT")]
    pub message: Option<String>,

    /// Refinement depth (overrides [evaluation] depth)
    #[arg(short, long, value_enum)]
    pub depth: Option<DepthArg>,

    /// Total rounds including the initial round
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub rounds: Option<u16>,

    /// Only run these agents (can be specified multiple times)
    #[arg(short, long, value_name = "NAME")]
    pub agent: Vec<String>,

    /// Skip the synthesis step
    #[arg(long)]
    pub no_synthesis: bool,

    /// Run agents one after another instead of concurrently
    #[arg(long)]
    pub sequential: bool,

    /// Output format (overrides [output] format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Write the evaluation transcript (JSONL) to this file
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,

    /// Also write diagnostic logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Whether the diff comes from standard input.
    pub fn reads_stdin(&self) -> bool {
        self.diff
            .as_deref()
            .is_none_or(|p| p.as_os_str() == "-")
    }
}
