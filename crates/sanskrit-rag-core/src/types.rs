//! Domain types shared by the retrieval and generation crates.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// A chunk of the corpus that is independently embedded and retrieved.
///
/// - `id`: `<doc_id>:<chunk_index>`
/// - `doc_path`: path of the corpus file the chunk came from
/// - `content`: the raw text of the chunk
/// - `chunk_index`/`total_chunks`: position within the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub doc_path: String,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// A ranked retrieval result.
///
/// `score` is the raw metric value: squared L2 distance (lower is better)
/// or cosine similarity (higher is better). `rank` is 0 for the best hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub content: String,
    pub score: f32,
    pub rank: usize,
}
