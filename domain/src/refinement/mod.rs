//! Self-refinement domain
//!
//! Policy ([`DepthProfile`]), question generation ([`QuestionTemplates`])
//! and the per-loop state machine ([`RefinementState`]). The loop that
//! drives generation lives in the application layer.

pub mod depth;
pub mod questions;
pub mod state;

pub use depth::{DepthMode, DepthProfile, DepthProfiles};
pub use questions::QuestionTemplates;
pub use state::{RefinementState, StopReason};
