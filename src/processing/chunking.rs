//! Recursive character chunking.
//!
//! Text is split on the coarsest separator present (`"\n\n"`, then `"\n"`, then `" "`, then
//! individual characters); pieces still longer than the chunk size are split again with the
//! next separator. Small pieces are merged back greedily into chunks of at most `chunk_size`
//! characters, and each new chunk starts with up to `chunk_overlap` characters carried over
//! from the previous one. Separators stay attached to the piece that follows them.
//!
//! Lengths are measured in Unicode scalar values, not bytes.

use std::collections::VecDeque;

use serde_json::{Map, Value, json};

use super::types::ChunkingError;
use crate::document::Document;

/// Maximum characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Characters shared by consecutive chunks of the same document.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Configured recursive splitter. Deterministic for identical input.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TextSplitter {
    /// Build a splitter with explicit size and overlap and the default separators.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkingError::InvalidOverlap {
                chunk_size,
                chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        })
    }

    /// Maximum chunk length in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive chunks in characters.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split raw text into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Split every document, copying its metadata into each chunk.
    ///
    /// Each chunk additionally receives `loc.lines.from` / `loc.lines.to`: the 1-based line
    /// span it occupies in the source text. Existing `loc` entries are preserved.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        let mut chunks = Vec::new();
        for document in documents {
            let text = &document.page_content;
            let mut previous_start: Option<usize> = None;

            for chunk in self.split_text(text) {
                let search_from = previous_start
                    .and_then(|start| {
                        text[start..]
                            .chars()
                            .next()
                            .map(|c| start + c.len_utf8())
                    })
                    .unwrap_or(0);
                let start = text[search_from..]
                    .find(chunk.as_str())
                    .map(|offset| search_from + offset)
                    .or(previous_start)
                    .unwrap_or(0);

                let from = 1 + count_newlines(&text[..start]);
                let to = from + count_newlines(&chunk);

                let mut metadata = document.metadata.clone();
                let mut loc = match metadata.remove("loc") {
                    Some(Value::Object(existing)) => existing,
                    _ => Map::new(),
                };
                loc.insert("lines".into(), json!({ "from": from, "to": to }));
                metadata.insert("loc".into(), Value::Object(loc));

                chunks.push(Document {
                    page_content: chunk,
                    metadata,
                });
                previous_start = Some(start);
            }
        }
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let (separator, remaining) = pick_separator(text, separators);
        let mut chunks = Vec::new();
        let mut small: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge_pieces(&small));
                small.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge_pieces(&small));
        }
        chunks
    }

    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut merged = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    tracing::warn!(
                        length = total,
                        chunk_size = self.chunk_size,
                        "Created a chunk longer than the configured size"
                    );
                }
                if !window.is_empty() {
                    if let Some(chunk) = join_window(&window) {
                        merged.push(chunk);
                    }
                    while total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0)
                    {
                        match window.pop_front() {
                            Some(dropped) => total -= char_len(dropped),
                            None => break,
                        }
                    }
                }
            }
            window.push_back(piece);
            total += len;
        }

        if let Some(chunk) = join_window(&window) {
            merged.push(chunk);
        }
        merged
    }
}

fn pick_separator<'a>(text: &str, separators: &'a [String]) -> (&'a str, &'a [String]) {
    for (index, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return ("", &[]);
        }
        if text.contains(separator.as_str()) {
            return (separator.as_str(), &separators[index + 1..]);
        }
    }
    (separators.last().map(String::as_str).unwrap_or(""), &[])
}

/// Split before every occurrence of `separator`; an empty separator splits into characters.
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(index, c)| &text[index..index + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (index, _) in text.match_indices(separator) {
        if index > start {
            pieces.push(&text[start..index]);
        }
        start = index;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn join_window(window: &VecDeque<&str>) -> Option<String> {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn count_newlines(text: &str) -> usize {
    text.matches('\n').count()
}
