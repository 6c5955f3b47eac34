//! Lexical retrieval over diff hunks and project documentation.
//!
//! A change is split into hunks (one per `@@` header, labelled with the file
//! path); documentation into sections (one per heading). Queries are scored
//! by term frequency, with a bonus for terms that appear in the file path.

use async_trait::async_trait;
use council_application::ports::retrieval::{
    RetrievalError, RetrievalPort, RetrievalQuery, RetrievalResult, RetrievalSource,
};
use council_domain::ChangeSet;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const MIN_TERM_CHARS: usize = 3;
const PATH_BONUS: usize = 3;
const DEFAULT_MAX_CHUNK_CHARS: usize = 4_000;

/// One retrievable unit of text
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// File path (diff) or document path (docs)
    pub label: String,
    pub text: String,
}

impl Chunk {
    fn render(&self, max_chars: usize) -> String {
        let text: String = self.text.chars().take(max_chars).collect();
        format!("### {}\n{}", self.label, text.trim_end())
    }
}

/// Split a unified diff into per-hunk chunks.
///
/// Lines before the first `diff --git` header or hunk header are kept as a
/// single preamble chunk (labelled `(preamble)`) when non-blank.
pub fn split_hunks(diff: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut file = String::from("(preamble)");
    let mut current = String::new();

    fn flush(label: &str, text: &mut String, chunks: &mut Vec<Chunk>) {
        if !text.trim().is_empty() {
            chunks.push(Chunk {
                label: label.to_string(),
                text: std::mem::take(text),
            });
        } else {
            text.clear();
        }
    }

    for line in diff.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            flush(&file, &mut current, &mut chunks);
            file = rest
                .split_whitespace()
                .last()
                .map(|p| p.trim_start_matches("b/").to_string())
                .unwrap_or_else(|| rest.to_string());
            continue;
        }
        if line.starts_with("--- ") || line.starts_with("+++ ") || line.starts_with("index ") {
            continue;
        }
        if line.starts_with("@@") {
            flush(&file, &mut current, &mut chunks);
        }
        current.push_str(line);
        current.push('\n');
    }
    flush(&file, &mut current, &mut chunks);
    chunks
}

/// Split a markdown/text document into sections at headings.
pub fn split_sections(label: &str, text: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.starts_with('#') && !current.trim().is_empty() {
            chunks.push(Chunk {
                label: label.to_string(),
                text: std::mem::take(&mut current),
            });
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        chunks.push(Chunk {
            label: label.to_string(),
            text: current,
        });
    }
    chunks
}

/// Lowercased, deduplicated query terms of at least three characters.
fn terms(query: &str) -> BTreeSet<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TERM_CHARS)
        .map(str::to_lowercase)
        .collect()
}

fn score(chunk: &Chunk, terms: &BTreeSet<String>) -> usize {
    let text = chunk.text.to_lowercase();
    let label = chunk.label.to_lowercase();
    terms
        .iter()
        .map(|term| {
            text.matches(term.as_str()).count()
                + if label.contains(term.as_str()) {
                    PATH_BONUS
                } else {
                    0
                }
        })
        .sum()
}

/// Top `k` chunks by score; ties keep document order, zero scores are dropped.
pub fn rank<'a>(chunks: &'a [Chunk], query: &str, k: usize) -> Vec<&'a Chunk> {
    let terms = terms(query);
    let mut scored: Vec<(usize, usize, &Chunk)> = chunks
        .iter()
        .enumerate()
        .map(|(i, c)| (score(c, &terms), i, c))
        .filter(|(s, _, _)| *s > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().take(k).map(|(_, _, c)| c).collect()
}

/// In-process retrieval backend
pub struct DiffRetriever {
    docs: Vec<Chunk>,
    max_chunk_chars: usize,
}

impl Default for DiffRetriever {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffRetriever {
    /// Retriever over the diff only.
    pub fn new() -> Self {
        Self {
            docs: Vec::new(),
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }

    /// Also index `*.md` and `*.txt` files under `dir` (recursively).
    pub fn with_docs(mut self, dir: &Path) -> Result<Self, RetrievalError> {
        if !dir.is_dir() {
            return Err(RetrievalError::Unavailable(format!(
                "docs directory {} not found",
                dir.display()
            )));
        }

        let mut files: Vec<PathBuf> = Vec::new();
        for ext in ["md", "txt"] {
            let pattern = dir.join("**").join(format!("*.{}", ext));
            let entries = glob::glob(&pattern.to_string_lossy())
                .map_err(|e| RetrievalError::Failed(e.to_string()))?;
            files.extend(entries.filter_map(Result::ok));
        }
        files.sort();

        for file in files {
            match std::fs::read_to_string(&file) {
                Ok(text) => {
                    let label = file
                        .strip_prefix(dir)
                        .unwrap_or(&file)
                        .display()
                        .to_string();
                    self.docs.extend(split_sections(&label, &text));
                }
                Err(e) => warn!("Skipping {}: {}", file.display(), e),
            }
        }
        debug!("Indexed {} documentation section(s)", self.docs.len());
        Ok(self)
    }

    pub fn with_max_chunk_chars(mut self, max_chars: usize) -> Self {
        self.max_chunk_chars = max_chars;
        self
    }

    pub fn doc_sections(&self) -> usize {
        self.docs.len()
    }

    /// Top chunks for one query, skipping chunks already returned earlier in the batch.
    fn answer(
        &self,
        chunks: &[Chunk],
        query: &RetrievalQuery,
        seen: &mut HashSet<(RetrievalSource, usize)>,
    ) -> RetrievalResult {
        let results_text = rank(chunks, &query.query, chunks.len())
            .into_iter()
            .filter_map(|chunk| {
                let index = chunks.iter().position(|c| std::ptr::eq(c, chunk))?;
                seen.insert((query.source, index)).then_some(chunk)
            })
            .take(query.top_k)
            .map(|c| c.render(self.max_chunk_chars))
            .collect::<Vec<_>>()
            .join("\n\n");
        RetrievalResult { results_text }
    }
}

#[async_trait]
impl RetrievalPort for DiffRetriever {
    async fn retrieve(
        &self,
        change: &ChangeSet,
        queries: &[RetrievalQuery],
    ) -> Result<Vec<RetrievalResult>, RetrievalError> {
        let hunks = split_hunks(change.diff());
        debug!("Diff split into {} hunk(s)", hunks.len());

        let mut seen = HashSet::new();
        Ok(queries
            .iter()
            .map(|query| match query.source {
                RetrievalSource::Diff => self.answer(&hunks, query, &mut seen),
                RetrievalSource::Docs => self.answer(&self.docs, query, &mut seen),
            })
            .collect())
    }
}
