//! Domain layer for pillar-council
//!
//! This crate contains the core evaluation logic: entities, value objects
//! and pure algorithms. It has no dependencies on infrastructure or
//! presentation concerns and performs no I/O.
//!
//! # Core Concepts
//!
//! ## Pillars
//!
//! A code change is scored along a fixed set of pillars (functional impact,
//! ideal time, test coverage, code quality, complexity, actual time,
//! technical debt; optionally debt reduction). See [`PillarRegistry`].
//!
//! ## Council
//!
//! Several agents, each with an [`ExpertiseProfile`], score every pillar:
//!
//! - **Self-refinement**: each agent critiques its own result until the
//!   [`ClarityEvaluator`] is satisfied or the [`DepthProfile`] runs out
//! - **Discussion**: agents see each other's results over several rounds,
//!   raise concerns and converge; a [`PillarAggregator`] produces the
//!   consensus scores

pub mod agent;
pub mod config;
pub mod core;
pub mod discussion;
pub mod evaluation;
pub mod pillar;
pub mod prompt;
pub mod refinement;

// Re-export commonly used types
pub use agent::{
    AgentDefinition, ConfigIssue, ConfigIssueCode, ExpertiseBand, ExpertiseProfile, Severity,
};
pub use config::OutputFormat;
pub use core::{change::ChangeSet, error::DomainError};
pub use discussion::{
    ConcernLedger, EvaluationReport, FinalSynthesis, PillarAggregator, RoundContext, RoundRecord,
    TeamConcern,
};
pub use evaluation::{
    AddressedConcern, AgentResult, ClarityEvaluator, ClarityReport, ClarityThresholds, Gap,
    GapKind, GapSeverity, JustificationKeywords, ResponseInterpreter, TokenUsage,
};
pub use pillar::{Pillar, PillarRegistry, PillarRule, PillarScores, PillarValue};
pub use prompt::PromptTemplate;
pub use refinement::{
    DepthMode, DepthProfile, DepthProfiles, QuestionTemplates, RefinementState, StopReason,
};
