use anyhow::{anyhow, Result};
use std::sync::Mutex;
use std::time::Instant;

use candle_core::{DType, Device, Tensor, D};
use candle_transformers::models::t5::{self, T5ForConditionalGeneration};
use tokenizers::Tokenizer;

use sanskrit_rag_core::config::GeneratorSettings;
use sanskrit_rag_core::error::Error;
use sanskrit_rag_core::traits::Seq2SeqModel;
use sanskrit_rag_embed::hub;
use sanskrit_rag_embed::tokenize::encode_truncated;

use crate::beam::{beam_search, BeamSearchParams};

/// FLAN-T5 (or any T5 checkpoint) decoding with beam search.
///
/// The decoder runs without its KV cache so every beam can be re-scored from
/// its full prefix in one batched call.
pub struct T5Generator {
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    device: Device,
    params: BeamSearchParams,
    max_input_tokens: usize,
}

impl T5Generator {
    /// Load the model and tokenizer with weights placed on `device`.
    pub fn new(settings: &GeneratorSettings, device: &Device) -> Result<Self> {
        let started = Instant::now();
        let device = device.clone();
        let model_dir = hub::resolve_model_dir(&settings.model_id, settings.model_dir.as_deref())?;
        let tokenizer = hub::load_tokenizer(&model_dir)?;
        let mut config: t5::Config = serde_json::from_value(hub::read_model_config(&model_dir)?)?;
        config.use_cache = false;
        let vb = hub::load_var_builder(&model_dir, &device)?;
        let model = T5ForConditionalGeneration::load(vb, &config)?;
        let params = BeamSearchParams {
            num_beams: settings.num_beams,
            max_new_tokens: settings.max_new_tokens,
            length_penalty: settings.length_penalty,
            start_token: config.decoder_start_token_id.unwrap_or(config.pad_token_id) as u32,
            eos_token: config.eos_token_id as u32,
        };
        tracing::info!(model = %settings.model_id, elapsed_ms = started.elapsed().as_millis() as u64, "generator loaded");
        Ok(Self { model: Mutex::new(model), tokenizer, device, params, max_input_tokens: settings.max_input_tokens })
    }
}

impl Seq2SeqModel for T5Generator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let started = Instant::now();
        let (ids, dropped) = encode_truncated(&self.tokenizer, prompt, self.max_input_tokens)?;
        if dropped > 0 {
            tracing::debug!(dropped, max_input_tokens = self.max_input_tokens, "prompt truncated");
        }
        let mut model = self.model.lock().map_err(|_| anyhow!("generator model lock poisoned"))?;
        let input_ids = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let encoder_output = model.encode(&input_ids)?;

        // Encoder output repeated once per beam, rebuilt only when the beam count changes.
        let mut expanded: Option<(usize, Tensor)> = None;
        let output = beam_search(&self.params, |seqs| {
            let n = seqs.len();
            let encoder_rows = match &expanded {
                Some((rows, t)) if *rows == n => t.clone(),
                _ => {
                    let t = encoder_output.repeat((n, 1, 1))?;
                    expanded = Some((n, t.clone()));
                    t
                }
            };
            let decoder_ids = Tensor::from_vec(seqs.concat(), (n, seqs[0].len()), &self.device)?;
            let logits = model.decode(&decoder_ids, &encoder_rows)?.to_dtype(DType::F32)?;
            let log_probs = candle_nn::ops::log_softmax(&logits, D::Minus1)?;
            Ok(log_probs.to_vec2::<f32>()?)
        })?;

        let answer = self.tokenizer.decode(&output, true).map_err(|e| Error::Tokenization(e.to_string()))?;
        tracing::info!(
            input_tokens = ids.len(),
            new_tokens = output.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated answer"
        );
        Ok(answer.trim().to_string())
    }
}
