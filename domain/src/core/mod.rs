//! Core domain concepts shared across all subdomains.
//!
//! - [`change::ChangeSet`]: the code change under evaluation
//! - [`error::DomainError`]: domain-level errors

pub mod change;
pub mod error;
pub mod string;
