use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;

use sanskrit_rag_core::config::{resolve_with_base, RetrieverSettings, Settings};
use sanskrit_rag_core::splitter::TextSplitter;
use sanskrit_rag_core::traits::{ContextRetriever, Embedder};
use sanskrit_rag_core::types::{DocumentChunk, SearchHit};
use sanskrit_rag_embed::get_default_embedder;

use crate::index::FlatIndex;

/// Embeds the corpus once and answers nearest-chunk queries against it.
/// Read-only after construction.
pub struct Retriever {
    embedder: Box<dyn Embedder>,
    index: FlatIndex,
    chunks: Vec<DocumentChunk>,
}

impl Retriever {
    /// Load the corpus named by `settings.data.corpus_path` (relative to `base`),
    /// split it, load the embedder and index every chunk.
    pub fn from_settings(base: &Path, settings: &Settings) -> Result<Self> {
        let corpus = resolve_with_base(base, &settings.data.corpus_path);
        let chunks = TextSplitter::new(settings.splitter.clone())?.process_file(&corpus)?;
        let embedder = get_default_embedder(&settings.embedder)?;
        Self::build(chunks, embedder, &settings.retriever)
    }

    pub fn build(chunks: Vec<DocumentChunk>, embedder: Box<dyn Embedder>, settings: &RetrieverSettings) -> Result<Self> {
        let started = Instant::now();
        let mut index = FlatIndex::new(settings.metric);
        if !chunks.is_empty() {
            let pb = ProgressBar::new(chunks.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?
                    .progress_chars("#>-"),
            );
            pb.set_message("embedding");
            for batch in chunks.chunks(settings.index_batch_size.max(1)) {
                let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
                let vectors = embedder.embed_batch(&texts)?;
                if vectors.len() != texts.len() {
                    anyhow::bail!("embedder returned {} vectors for {} chunks", vectors.len(), texts.len());
                }
                for v in &vectors { index.add(v)?; }
                pb.inc(batch.len() as u64);
            }
            pb.finish_with_message("indexed");
        }
        tracing::info!(
            chunks = index.len(),
            dim = index.dim().unwrap_or(embedder.dim()),
            metric = ?settings.metric,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "vector index built"
        );
        Ok(Self { embedder, index, chunks })
    }

    pub fn len(&self) -> usize { self.chunks.len() }
    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

    /// Up to `k` chunks nearest to `query`, best first.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        if self.index.is_empty() || k == 0 { return Ok(vec![]); }
        let query_vec = self.embedder.embed_query(query)?;
        let hits = self
            .index
            .search(&query_vec, k)?
            .into_iter()
            .enumerate()
            .map(|(rank, (pos, score))| SearchHit { id: self.chunks[pos].id.clone(), content: self.chunks[pos].content.clone(), score, rank })
            .collect::<Vec<_>>();
        tracing::debug!(k, hits = hits.len(), "retrieved");
        Ok(hits)
    }

    /// Texts of the top `k` chunks joined by newlines, best match first.
    pub fn get_context(&self, query: &str, k: usize) -> Result<String> {
        let hits = self.search(query, k)?;
        Ok(hits.into_iter().map(|h| h.content).collect::<Vec<_>>().join("\n"))
    }
}

impl ContextRetriever for Retriever {
    fn get_context(&self, query: &str, k: usize) -> Result<String> { Retriever::get_context(self, query, k) }
}
