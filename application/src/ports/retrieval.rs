//! Retrieval port
//!
//! Supplies focused excerpts of a large change (and optional project
//! documentation) so agents do not have to read the whole diff.

use async_trait::async_trait;
use council_domain::ChangeSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during retrieval
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Retrieval backend unavailable: {0}")]
    Unavailable(String),

    #[error("Retrieval failed: {0}")]
    Failed(String),
}

/// Corpus a query runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalSource {
    /// Hunks of the change under evaluation
    Diff,
    /// Project documentation
    Docs,
}

/// One retrieval query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalQuery {
    pub query: String,
    pub top_k: usize,
    pub source: RetrievalSource,
}

impl RetrievalQuery {
    pub fn new(query: impl Into<String>, top_k: usize, source: RetrievalSource) -> Self {
        Self {
            query: query.into(),
            top_k,
            source,
        }
    }
}

/// Excerpts returned for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResult {
    pub results_text: String,
}

/// Port for retrieving change excerpts
#[async_trait]
pub trait RetrievalPort: Send + Sync {
    /// Run a batch of queries; one result per query, in order.
    ///
    /// An excerpt is returned at most once per batch.
    async fn retrieve(
        &self,
        change: &ChangeSet,
        queries: &[RetrievalQuery],
    ) -> Result<Vec<RetrievalResult>, RetrievalError>;
}
