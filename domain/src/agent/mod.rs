//! Agent domain
//!
//! Agents are data, not code: a name, a role, and an [`ExpertiseProfile`]
//! that decides which pillars the agent is accountable for. The same
//! interpreter, clarity evaluator and refinement loop serve every agent.

pub mod definition;
pub mod expertise;
pub mod validation;

pub use definition::AgentDefinition;
pub use expertise::{ExpertiseBand, ExpertiseProfile, PRIMARY_MIN_WEIGHT, SECONDARY_MIN_WEIGHT};
pub use validation::{ConfigIssue, ConfigIssueCode, Severity};
