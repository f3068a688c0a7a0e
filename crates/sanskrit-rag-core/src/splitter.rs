//! Corpus loading and chunking.
//!
//! Two strategies share one `ChunkingConfig`:
//! - `Window`: fixed windows of `chunk_size` characters advancing by
//!   `chunk_size - chunk_overlap`. Covers every character and gives adjacent
//!   chunks exactly `chunk_overlap` characters in common.
//! - `Recursive`: separator-aware splitting on paragraphs, lines, spaces and
//!   finally characters, merging pieces back up to `chunk_size` and carrying
//!   up to `chunk_overlap` characters into the next chunk.
//!
//! Lengths are counted in Unicode scalar values, not bytes.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::Error;
use crate::types::DocumentChunk;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    #[default]
    Window,
    Recursive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub strategy: SplitStrategy,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 500, chunk_overlap: 50, strategy: SplitStrategy::Window }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("splitter.chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "splitter.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: ChunkingConfig,
}

impl Default for TextSplitter {
    fn default() -> Self { Self { config: ChunkingConfig::default() } }
}

impl TextSplitter {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Read the corpus file and split it into ordered chunks.
    pub fn process_file(&self, path: &Path) -> Result<Vec<DocumentChunk>> {
        let content = load_corpus(path)?;
        let doc_id = path.file_stem().and_then(|s| s.to_str()).unwrap_or("corpus");
        let pieces = self.split_text(&content);
        let total_chunks = pieces.len();
        let chunks: Vec<DocumentChunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| DocumentChunk {
                id: format!("{}:{}", doc_id, chunk_index),
                doc_path: path.to_string_lossy().to_string(),
                content,
                chunk_index,
                total_chunks,
            })
            .collect();
        tracing::info!(
            path = %path.display(),
            chars = content.chars().count(),
            chunks = chunks.len(),
            strategy = ?self.config.strategy,
            "split corpus"
        );
        Ok(chunks)
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        match self.config.strategy {
            SplitStrategy::Window => self.split_window(text),
            SplitStrategy::Recursive => self.split_recursive(text, &SEPARATORS),
        }
    }

    fn split_window(&self, text: &str) -> Vec<String> {
        // Byte offset of every char boundary, including the end of the text.
        let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let len = bounds.len() - 1;
        if len == 0 { return vec![]; }
        let step = self.config.chunk_size - self.config.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.config.chunk_size).min(len);
            chunks.push(text[bounds[start]..bounds[end]].to_string());
            if end == len { break; }
            start += step;
        }
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut separator = separators[separators.len() - 1];
        let mut remaining: &[&str] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() { separator = sep; break; }
            if text.contains(sep) { separator = sep; remaining = &separators[i + 1..]; break; }
        }

        let mut chunks = Vec::new();
        let mut good: Vec<&str> = Vec::new();
        for piece in split_keep_separator(text, separator) {
            if char_len(piece) < self.config.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                chunks.extend(self.merge_pieces(&good));
                good.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }
        if !good.is_empty() { chunks.extend(self.merge_pieces(&good)); }
        chunks
    }

    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let (size, overlap) = (self.config.chunk_size, self.config.chunk_overlap);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;
        for piece in pieces {
            let len = char_len(piece);
            if total + len > size {
                if total > size {
                    tracing::warn!(total, size, "created a chunk longer than the configured size");
                }
                if !current.is_empty() {
                    if let Some(doc) = join_trimmed(&current) { docs.push(doc); }
                    while total > overlap || (total + len > size && total > 0) {
                        match current.pop_front() {
                            Some(front) => total -= char_len(front),
                            None => break,
                        }
                    }
                }
            }
            current.push_back(piece);
            total += len;
        }
        if let Some(doc) = join_trimmed(&current) { docs.push(doc); }
        docs
    }
}

/// Read a UTF-8 corpus file. Missing files and invalid UTF-8 are errors.
pub fn load_corpus(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => anyhow::Error::new(Error::NotFound(format!("corpus file {}", path.display()))),
        _ => anyhow::Error::new(e).context(format!("failed to read {}", path.display())),
    })?;
    String::from_utf8(bytes).map_err(|_| Error::Decode(path.to_path_buf()).into())
}

fn char_len(s: &str) -> usize { s.chars().count() }

/// Split on a literal separator, keeping it at the start of the following piece.
/// An empty separator splits into single characters. Empty pieces are dropped.
fn split_keep_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect();
    }
    let mut pieces = Vec::new();
    let mut last = 0;
    for (idx, _) in text.match_indices(separator) {
        pieces.push(&text[last..idx]);
        last = idx;
    }
    pieces.push(&text[last..]);
    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

fn join_trimmed(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}
