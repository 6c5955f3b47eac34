//! Retrieval backends implementing the retrieval port.

mod diff_index;

pub use diff_index::{Chunk, DiffRetriever, rank, split_hunks, split_sections};
