//! sanskrit-rag-embed
//!
//! Sentence embeddings with candle: a multilingual BERT encoder with masked
//! mean pooling, plus a deterministic hashing embedder for tests.

use anyhow::Result;
use std::time::Instant;

use candle_core::{DType, Device};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use sanskrit_rag_core::config::EmbedderSettings;
use sanskrit_rag_core::traits::Embedder;

pub mod device;
pub mod hub;
pub mod pool;
pub mod tokenize;

pub use device::{device_label, select_device};
pub use pool::{l2_normalize, masked_mean};

const FORWARD_BATCH: usize = 16;
const FAKE_DIM: usize = 384;

pub struct SentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    pad_id: u32,
    normalize: bool,
}

impl SentenceEmbedder {
    pub fn new(settings: &EmbedderSettings) -> Result<Self> {
        let started = Instant::now();
        let device = select_device();
        let model_dir = hub::resolve_model_dir(&settings.model_id, settings.model_dir.as_deref())?;
        let tokenizer = hub::load_tokenizer(&model_dir)?;
        let raw_config = hub::read_model_config(&model_dir)?;
        let dim = raw_config["hidden_size"].as_u64().unwrap_or(384) as usize;
        let max_positions = raw_config["max_position_embeddings"].as_u64().unwrap_or(512) as usize;
        let config: BertConfig = serde_json::from_value(raw_config)?;
        let vb = hub::load_var_builder(&model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        let pad_id = tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .or_else(|| tokenizer.token_to_id("<pad>"))
            .unwrap_or(0);
        tracing::info!(model = %settings.model_id, dim, elapsed_ms = started.elapsed().as_millis() as u64, "sentence embedder loaded");
        Ok(Self { model, tokenizer, device, dim, max_len: settings.max_len.min(max_positions), pad_id, normalize: settings.normalize })
    }

    fn embed_rows(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let (input_ids, attention_mask) = tokenize::tokenize_batch(&self.tokenizer, texts, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let mut pooled = masked_mean(&hidden, &attention_mask)?;
        if self.normalize { pooled = l2_normalize(&pooled)?; }
        Ok(pooled.to_device(&Device::Cpu)?.to_dtype(DType::F32)?.to_vec2::<f32>()?)
    }
}

impl Embedder for SentenceEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(FORWARD_BATCH) { out.extend(self.embed_rows(batch)?); }
        let per_text = start.elapsed().as_millis() / texts.len().max(1) as u128;
        if per_text > 100 { tracing::warn!(per_text_ms = per_text as u64, texts = texts.len(), "slow embedding"); }
        Ok(out)
    }
}

/// Hashes whitespace tokens into a fixed-size, L2-normalised vector.
/// Identical text always gives the identical vector.
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim } }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|t| self.embed_text(t)).collect()) }
}

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// The configured sentence embedder, or the `FakeEmbedder` when
/// `APP_USE_FAKE_EMBEDDINGS=1`.
pub fn get_default_embedder(settings: &EmbedderSettings) -> Result<Box<dyn Embedder>> {
    if use_fake_embeddings() {
        tracing::info!(dim = FAKE_DIM, "using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(FAKE_DIM)));
    }
    Ok(Box::new(SentenceEmbedder::new(settings)?))
}
