//! Evaluation domain
//!
//! Turning raw generated text into structured [`AgentResult`]s and judging
//! how complete and well-justified they are.

pub mod clarity;
pub mod interpreter;
pub mod keywords;
pub mod result;

pub use clarity::{
    ClarityEvaluator, ClarityReport, ClarityThresholds, Gap, GapKind, GapSeverity,
};
pub use interpreter::ResponseInterpreter;
pub use keywords::JustificationKeywords;
pub use result::{AddressedConcern, AgentResult, TokenUsage};
