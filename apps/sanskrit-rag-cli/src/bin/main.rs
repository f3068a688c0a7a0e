use std::env;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sanskrit_rag_core::config::{resolve_with_base, Config, Settings};
use sanskrit_rag_pipeline::RagSystem;

/// Ask questions about a Sanskrit corpus; answers come only from retrieved passages.
#[derive(Parser)]
#[command(name = "sanskrit-rag")]
#[command(version)]
#[command(about = "Retrieval-augmented question answering over a Sanskrit corpus", long_about = None)]
struct Cli {
    /// Directory holding config.toml; a relative data.corpus_path from config resolves against it
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Corpus file, overriding data.corpus_path; relative to the current directory
    #[arg(long)]
    corpus: Option<String>,

    /// Number of passages retrieved per question, overriding retriever.top_k
    #[arg(short = 'k', long)]
    top_k: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load_from(&cli.config_dir).map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let mut settings = config.settings()?;
    apply_overrides(&cli, &mut settings, &env::current_dir()?);
    tracing::debug!(?settings, "effective settings");

    let stdout = io::stdout();
    let system = RagSystem::load(&cli.config_dir, &settings, &mut stdout.lock())?;
    system.session().run(io::stdin().lock(), stdout.lock())
}

/// Fold command-line overrides into `settings`. `--corpus` is anchored at
/// `cwd` so it does not move with `--config-dir`.
fn apply_overrides(cli: &Cli, settings: &mut Settings, cwd: &Path) {
    if let Some(corpus) = &cli.corpus {
        settings.data.corpus_path = resolve_with_base(cwd, corpus).to_string_lossy().into_owned();
    }
    if let Some(k) = cli.top_k { settings.retriever.top_k = k; }
}
