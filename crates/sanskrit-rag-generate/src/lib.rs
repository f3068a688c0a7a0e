//! sanskrit-rag-generate
//!
//! Answers a question from retrieved context with an encoder-decoder model.
//! An empty context short-circuits to a fixed Sanskrit fallback without
//! touching the model.

use anyhow::Result;
use candle_core::Device;

use sanskrit_rag_core::config::GeneratorSettings;
use sanskrit_rag_core::traits::{AnswerGenerator, Seq2SeqModel};

pub mod beam;
pub mod t5;

pub use beam::{beam_search, BeamSearchParams};
pub use t5::T5Generator;

/// "Context not found. Please ask another question."
pub const FALLBACK_ANSWER: &str = "संदर्भः न लभ्यते। कृपया अन्यं प्रश्नं पृच्छतु।";

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a Sanskrit scholar.\n\
         Answer the question strictly using the context.\n\n\
         Context:\n{context}\n\n\
         Question:\n{question}\n\n\
         Answer in clear Sanskrit sentences:"
    )
}

pub struct Generator {
    model: Box<dyn Seq2SeqModel>,
}

impl Generator {
    pub fn new(model: Box<dyn Seq2SeqModel>) -> Self { Self { model } }

    pub fn from_settings(settings: &GeneratorSettings, device: &Device) -> Result<Self> {
        Ok(Self::new(get_default_model(settings, device)?))
    }

    pub fn generate(&self, context: &str, question: &str) -> Result<String> {
        if context.trim().is_empty() {
            tracing::debug!("empty context, returning fallback answer");
            return Ok(FALLBACK_ANSWER.to_string());
        }
        let answer = self.model.generate(&build_prompt(context, question))?;
        Ok(answer.trim().to_string())
    }
}

impl AnswerGenerator for Generator {
    fn generate(&self, context: &str, question: &str) -> Result<String> { Generator::generate(self, context, question) }
}

/// Answers with the first non-empty line of the prompt's context section.
pub struct FakeSeq2Seq;

impl Seq2SeqModel for FakeSeq2Seq {
    fn generate(&self, prompt: &str) -> Result<String> {
        let context = prompt
            .split_once("Context:\n")
            .and_then(|(_, rest)| rest.split_once("\n\nQuestion:"))
            .map(|(context, _)| context)
            .unwrap_or_default();
        Ok(context.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or_default().to_string())
    }
}

pub fn use_fake_generator() -> bool {
    std::env::var("APP_USE_FAKE_GENERATOR").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// The configured T5 model, or `FakeSeq2Seq` when `APP_USE_FAKE_GENERATOR=1`.
pub fn get_default_model(settings: &GeneratorSettings, device: &Device) -> Result<Box<dyn Seq2SeqModel>> {
    if use_fake_generator() {
        tracing::info!("using FakeSeq2Seq");
        return Ok(Box::new(FakeSeq2Seq));
    }
    Ok(Box::new(T5Generator::new(settings, device)?))
}
