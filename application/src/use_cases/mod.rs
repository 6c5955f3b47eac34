//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod refine_agent;
pub mod run_evaluation;
