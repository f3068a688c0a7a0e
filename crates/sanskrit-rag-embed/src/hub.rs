//! Locating and loading pretrained model artifacts.
//!
//! A model directory holds `config.json`, `tokenizer.json` and either
//! `model.safetensors` or `pytorch_model.bin`. Directories are looked up in
//! this order: an explicit `model_dir`, `models/<name>`, `../models/<name>`,
//! then the Hugging Face hub cache snapshot for the model id.

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use sanskrit_rag_core::config::expand_path;
use sanskrit_rag_core::error::Error;

pub fn resolve_model_dir(model_id: &str, explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = explicit.filter(|d| !d.trim().is_empty()) {
        let p = expand_path(dir);
        if p.is_dir() {
            tracing::info!(model = model_id, dir = %p.display(), "using configured model dir");
            return Ok(p);
        }
        return Err(Error::NotFound(format!("model directory {} for {}", p.display(), model_id)).into());
    }
    let name = model_id.rsplit('/').next().unwrap_or(model_id);
    for root in ["models", "../models"] {
        let p = Path::new(root).join(name);
        if p.is_dir() {
            tracing::info!(model = model_id, dir = %p.display(), "using local model dir");
            return Ok(p);
        }
    }
    if let Some(p) = hub_cache_snapshot(&hub_cache_root(), model_id) {
        tracing::info!(model = model_id, dir = %p.display(), "using hub cache snapshot");
        return Ok(p);
    }
    Err(Error::NotFound(format!(
        "model {model_id}: set its model_dir, place it under models/{name}, or fetch it with `huggingface-cli download {model_id}`"
    ))
    .into())
}

fn hub_cache_root() -> PathBuf {
    if let Ok(dir) = env::var("HF_HUB_CACHE") { return expand_path(dir); }
    if let Ok(home) = env::var("HF_HOME") { return expand_path(home).join("hub"); }
    expand_path("~/.cache/huggingface/hub")
}

/// Snapshot directory of `model_id` inside a hub cache rooted at `root`.
/// Follows `refs/main` when present, otherwise picks the last snapshot by name.
pub fn hub_cache_snapshot(root: &Path, model_id: &str) -> Option<PathBuf> {
    let repo = root.join(format!("models--{}", model_id.replace('/', "--")));
    let snapshots = repo.join("snapshots");
    if let Ok(rev) = fs::read_to_string(repo.join("refs").join("main")) {
        let p = snapshots.join(rev.trim());
        if p.is_dir() { return Some(p); }
    }
    let mut dirs: Vec<PathBuf> = fs::read_dir(&snapshots)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs.pop()
}

pub fn load_tokenizer(model_dir: &Path) -> Result<Tokenizer> {
    let path = model_dir.join("tokenizer.json");
    if !path.exists() { return Err(Error::NotFound(format!("tokenizer {}", path.display())).into()); }
    Tokenizer::from_file(&path).map_err(|e| anyhow::anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))
}

/// Raw `config.json` of a model directory.
pub fn read_model_config(model_dir: &Path) -> Result<serde_json::Value> {
    let path = model_dir.join("config.json");
    let raw = fs::read_to_string(&path).map_err(|_| Error::NotFound(format!("model config {}", path.display())))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid model config {}", path.display()))
}

/// Load all weights as f32 on `device`, preferring safetensors over pickle.
pub fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    let pickle = model_dir.join("pytorch_model.bin");
    let weights: HashMap<String, Tensor> = if safetensors.exists() {
        candle_core::safetensors::load(&safetensors, &Device::Cpu)
            .with_context(|| format!("failed to read {}", safetensors.display()))?
    } else if pickle.exists() {
        candle_core::pickle::read_all(&pickle)
            .with_context(|| format!("failed to read {}", pickle.display()))?
            .into_iter()
            .collect()
    } else {
        return Err(Error::NotFound(format!("weights under {}", model_dir.display())).into());
    };
    tracing::debug!(tensors = weights.len(), dir = %model_dir.display(), "loaded weights");
    Ok(VarBuilder::from_tensors(weights, DType::F32, device))
}
