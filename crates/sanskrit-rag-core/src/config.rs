//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_RETRIEVER__TOP_K=5`). Provides
//! helpers to expand `~` and `${VAR}` and to resolve relative paths against a
//! known base directory.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::splitter::ChunkingConfig;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            other => tracing::debug!(env = other, "no environment-specific config file for RUST_ENV"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract every typed section, falling back to defaults for missing keys.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub splitter: ChunkingConfig,
    pub retriever: RetrieverSettings,
    pub embedder: EmbedderSettings,
    pub generator: GeneratorSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        self.splitter.validate()?;
        if self.retriever.index_batch_size == 0 {
            return Err(Error::InvalidConfig("retriever.index_batch_size must be positive".into()));
        }
        if self.embedder.max_len == 0 {
            return Err(Error::InvalidConfig("embedder.max_len must be positive".into()));
        }
        let g = &self.generator;
        if g.num_beams == 0 {
            return Err(Error::InvalidConfig("generator.num_beams must be positive".into()));
        }
        if g.max_new_tokens == 0 || g.max_input_tokens < 2 {
            return Err(Error::InvalidConfig(format!(
                "generator token limits too small (max_input_tokens={}, max_new_tokens={})",
                g.max_input_tokens, g.max_new_tokens
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub corpus_path: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { corpus_path: "data/sanskrit_docs.txt".to_string() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared Euclidean distance, lower is closer.
    #[default]
    L2,
    /// Cosine similarity, higher is closer.
    Cosine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverSettings {
    pub top_k: usize,
    pub metric: DistanceMetric,
    pub index_batch_size: usize,
}

impl Default for RetrieverSettings {
    fn default() -> Self {
        Self { top_k: 3, metric: DistanceMetric::L2, index_batch_size: 32 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderSettings {
    pub model_id: String,
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub normalize: bool,
}

impl Default for EmbedderSettings {
    fn default() -> Self {
        Self {
            model_id: "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".to_string(),
            model_dir: None,
            max_len: 128,
            normalize: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub model_id: String,
    pub model_dir: Option<String>,
    pub max_input_tokens: usize,
    pub max_new_tokens: usize,
    pub num_beams: usize,
    pub length_penalty: f32,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            model_id: "google/flan-t5-base".to_string(),
            model_dir: None,
            max_input_tokens: 512,
            max_new_tokens: 120,
            num_beams: 4,
            length_penalty: 1.0,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
