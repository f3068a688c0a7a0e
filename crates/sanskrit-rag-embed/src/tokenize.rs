use anyhow::Result;
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

use sanskrit_rag_core::error::Error;

/// Encode `text` with special tokens and cut it to `max_len` ids.
///
/// A trailing special token (`[SEP]`, `</s>`) survives truncation. Returns the
/// ids and how many were dropped.
pub fn encode_truncated(tokenizer: &Tokenizer, text: &str, max_len: usize) -> Result<(Vec<u32>, usize)> {
    let enc = tokenizer.encode(text, true).map_err(|e| Error::Tokenization(e.to_string()))?;
    let mut ids = enc.get_ids().to_vec();
    let dropped = ids.len().saturating_sub(max_len);
    if dropped > 0 {
        let ends_special = enc.get_special_tokens_mask().last() == Some(&1);
        match ids.last().copied() {
            Some(last) if ends_special && max_len > 0 => { ids.truncate(max_len - 1); ids.push(last); }
            _ => ids.truncate(max_len),
        }
    }
    Ok((ids, dropped))
}

/// Tokenize a batch, padding every row to the longest one with `pad_id`.
/// Returns `(input_ids, attention_mask)`, both `[B,T]` u32.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, pad_id: u32, device: &Device) -> Result<(Tensor, Tensor)> {
    let rows = texts
        .iter()
        .map(|t| encode_truncated(tokenizer, t, max_len).map(|(ids, _)| ids))
        .collect::<Result<Vec<_>>>()?;
    let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let mut ids = Vec::with_capacity(rows.len() * width);
    let mut mask = Vec::with_capacity(rows.len() * width);
    for row in &rows {
        let pad = width - row.len();
        ids.extend_from_slice(row);
        ids.extend(std::iter::repeat(pad_id).take(pad));
        mask.extend(std::iter::repeat(1u32).take(row.len()));
        mask.extend(std::iter::repeat(0u32).take(pad));
    }
    let input_ids = Tensor::from_vec(ids, (rows.len(), width), device)?;
    let attention_mask = Tensor::from_vec(mask, (rows.len(), width), device)?;
    Ok((input_ids, attention_mask))
}
