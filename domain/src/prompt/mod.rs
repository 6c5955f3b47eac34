//! Prompt domain
//!
//! Templates for the prompts sent at each stage of an evaluation: agent
//! system instructions, initial and discussion rounds, refinement cycles
//! and the final synthesis.

mod template;

pub use template::PromptTemplate;
