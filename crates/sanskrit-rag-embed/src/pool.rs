use anyhow::Result;
use candle_core::{DType, Tensor};

/// Mean of the hidden states over unmasked tokens: `[B,T,H]` + `[B,T]` -> `[B,H]`.
pub fn masked_mean(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _time, hidden_dim) = hidden.dims3()?;
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let masked = hidden.broadcast_mul(&mask.unsqueeze(2)?)?;
    let sum = masked.sum(1)?;
    let lengths = mask.sum_keepdim(1)?;
    let mean = sum.broadcast_div(&lengths)?;
    assert_eq!(mean.dims(), &[batch, hidden_dim]);
    Ok(mean)
}

/// Row-wise L2 normalisation of a `[B,H]` tensor.
pub fn l2_normalize(rows: &Tensor) -> Result<Tensor> {
    let eps = match rows.dtype() { DType::F16 | DType::BF16 => 1e-6, _ => 1e-12 };
    let norm = (rows.sqr()?.sum_keepdim(1)?.sqrt()? + eps)?;
    Ok(rows.broadcast_div(&norm)?)
}
