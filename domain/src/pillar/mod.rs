//! Pillar registry
//!
//! The named numeric dimensions every agent scores, their validity rules,
//! and the metric map carried by each result.

pub mod registry;
pub mod value;

pub use registry::{Pillar, PillarRegistry, PillarRule, Sign};
pub use value::{PillarScores, PillarValue};
