pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector for query"))
    }
}

/// An encoder-decoder model that turns a full prompt into an answer.
pub trait Seq2SeqModel: Send + Sync {
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

pub trait ContextRetriever {
    fn get_context(&self, query: &str, k: usize) -> anyhow::Result<String>;
}

pub trait AnswerGenerator {
    fn generate(&self, context: &str, question: &str) -> anyhow::Result<String>;
}
