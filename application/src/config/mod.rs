//! Application-level configuration.
//!
//! - [`EvaluationParams`]: council run control (depth, rounds, concurrency, timeouts)

pub mod evaluation_params;

pub use evaluation_params::EvaluationParams;
