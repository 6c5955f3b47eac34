//! CLI entrypoint for pillar-council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use council_application::{
    ConversationLogger, NoProgress, ProgressNotifier, RetrievalPort, RunEvaluationInput,
    RunEvaluationUseCase,
};
use council_domain::{
    AgentDefinition, ChangeSet, ClarityEvaluator, ClarityThresholds, ConfigIssue, DepthMode,
    JustificationKeywords, OutputFormat, QuestionTemplates, Severity,
};
use council_infrastructure::{
    ConfigLoader, DiffRetriever, FileConfig, JsonlConversationLogger, ProviderGateway,
};
use council_presentation::{Cli, ConsoleFormatter, OutputFormatter, ProgressReporter};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines reach the file
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())?
    };
    report_issues(&config.validate())?;

    info!("Starting pillar-council");

    let (mut params, _) = config.evaluation_params();
    let mut depth = config.evaluation.parse_depth().0;
    if let Some(arg) = cli.depth {
        depth = DepthMode::from(arg);
        let (profiles, _) = config.depth.to_profiles();
        params = params.with_depth(profiles.get(depth));
    }
    if let Some(rounds) = cli.rounds {
        params = params.with_rounds(usize::from(rounds));
    }
    if cli.sequential {
        params = params.with_concurrent(false);
    }
    if cli.no_synthesis {
        params = params.with_synthesis(false);
    }

    let (roster, _) = config.roster();
    let agents = filter_roster(roster, &cli.agent)?;

    // === Input ===
    let diff = read_diff(&cli)?;
    let mut change = ChangeSet::new(diff)?;
    if let Some(message) = &cli.message {
        change = change.with_message(message.clone());
    }

    // === Dependency Injection ===
    let gateway = Arc::new(ProviderGateway::from_config(&config.provider)?);

    let registry = config.evaluation.registry();
    let evaluator = ClarityEvaluator::new(
        registry,
        JustificationKeywords::default(),
        ClarityThresholds::default(),
    );

    let mut retriever = DiffRetriever::new();
    if let Some(dir) = &config.evaluation.docs_dir {
        retriever = retriever
            .with_docs(dir)
            .with_context(|| format!("failed to index documentation in {}", dir.display()))?;
    }
    let retriever: Arc<dyn RetrievalPort> = Arc::new(retriever);

    let mut use_case = RunEvaluationUseCase::new(gateway)
        .with_refinement(evaluator, QuestionTemplates::default())
        .with_retrieval(retriever);

    if let Some(logger) = transcript_logger(&cli, &config)? {
        use_case = use_case.with_conversation_logger(logger);
    }

    let format = cli
        .output
        .map(OutputFormat::from)
        .or(config.output.format)
        .unwrap_or_default();
    if !config.output.color {
        colored::control::set_override(false);
    }

    if !cli.quiet && format != OutputFormat::Json {
        print_header(&change, &agents, params.rounds, depth);
    }

    let input = RunEvaluationInput::new(change, agents).with_params(params);

    // Execute with or without progress reporting
    let progress: Box<dyn ProgressNotifier> = if cli.quiet {
        Box::new(NoProgress)
    } else {
        Box::new(ProgressReporter::new())
    };
    let report = use_case
        .execute_with_progress(input, progress.as_ref())
        .await?;

    println!("{}", ConsoleFormatter.render(&report, format));

    Ok(())
}

/// Initialize tracing: stderr filtered by `-v`, plus an optional log file.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(level));

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(stderr_layer).init();
        return Ok(None);
    };

    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let Some(file_name) = path.file_name() else {
        bail!("--log-file must name a file: {}", path.display());
    };
    std::fs::create_dir_all(directory)
        .with_context(|| format!("failed to create {}", directory.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(EnvFilter::new(if verbose == 0 { "info" } else { level }));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(Some(guard))
}

/// Log configuration issues; fail when any of them is an error.
fn report_issues(issues: &[ConfigIssue]) -> Result<()> {
    for issue in issues {
        match issue.severity {
            Severity::Warning => warn!("{}", issue),
            Severity::Error => tracing::error!("{}", issue),
        }
    }
    if ConfigIssue::has_errors(issues) {
        bail!("invalid configuration ({} issue(s), see above)", issues.len());
    }
    Ok(())
}

/// Restrict the roster to the `--agent` names, keeping roster order.
fn filter_roster(roster: Vec<AgentDefinition>, names: &[String]) -> Result<Vec<AgentDefinition>> {
    if names.is_empty() {
        return Ok(roster);
    }

    let unknown: Vec<&str> = names
        .iter()
        .filter(|name| !roster.iter().any(|a| &a.name == *name))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        let available: Vec<&str> = roster.iter().map(|a| a.name.as_str()).collect();
        bail!(
            "unknown agent(s): {} (available: {})",
            unknown.join(", "),
            available.join(", ")
        );
    }

    Ok(roster
        .into_iter()
        .filter(|a| names.contains(&a.name))
        .collect())
}

fn read_diff(cli: &Cli) -> Result<String> {
    match &cli.diff {
        Some(path) if !cli.reads_stdin() => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read diff {}", path.display())),
        _ => {
            let mut diff = String::new();
            std::io::stdin()
                .read_to_string(&mut diff)
                .context("failed to read diff from standard input")?;
            Ok(diff)
        }
    }
}

/// Transcript from `--transcript`, else from `[logging] transcript`.
fn transcript_logger(cli: &Cli, config: &FileConfig) -> Result<Option<Arc<dyn ConversationLogger>>> {
    let (path, append) = match (&cli.transcript, &config.logging.transcript) {
        (Some(path), _) => (path, false),
        (None, Some(path)) => (path, config.logging.append_transcript),
        (None, None) => return Ok(None),
    };

    let logger = if append {
        JsonlConversationLogger::append(path)
    } else {
        JsonlConversationLogger::create(path)
    }
    .with_context(|| format!("failed to open transcript {}", path.display()))?;

    info!("Writing transcript to {}", logger.path().display());
    Ok(Some(Arc::new(logger)))
}

fn print_header(change: &ChangeSet, agents: &[AgentDefinition], rounds: usize, depth: DepthMode) {
    eprintln!();
    eprintln!("+============================================================+");
    eprintln!("|           pillar-council - Code Review Council             |");
    eprintln!("+============================================================+");
    eprintln!();
    if let Some(message) = change.message() {
        eprintln!("Change: {}", message);
    }
    eprintln!(
        "Files: {} ({} bytes)",
        change.touched_files().len(),
        change.len()
    );
    eprintln!(
        "Agents: {}",
        agents
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    eprintln!("Rounds: {} | Depth: {}", rounds, depth);
    eprintln!();
}
