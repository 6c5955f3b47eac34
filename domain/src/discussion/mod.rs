//! Team discussion domain
//!
//! Data carried between rounds ([`RoundContext`], [`ConcernLedger`]) and
//! what the protocol produces at the end ([`PillarAggregator`],
//! [`FinalSynthesis`], [`EvaluationReport`]).

pub mod aggregate;
pub mod concerns;
pub mod context;
pub mod report;
pub mod synthesis;

pub use aggregate::PillarAggregator;
pub use concerns::{Acknowledgement, ConcernLedger};
pub use context::{RoundContext, TeamConcern};
pub use report::{EvaluationReport, RoundRecord};
pub use synthesis::{FinalSynthesis, score_evolution};
