//! sanskrit-rag-pipeline
//!
//! Wires the retriever and generator together and drives the interactive
//! session over them.

use anyhow::Result;
use std::io::Write;
use std::path::Path;

use sanskrit_rag_core::config::Settings;
use sanskrit_rag_embed::{device_label, select_device};
use sanskrit_rag_generate::Generator;
use sanskrit_rag_vector::Retriever;

pub mod session;

pub use session::{parse_command, Command, Session, SessionState};

/// The loaded corpus index and generator; one instance per process.
pub struct RagSystem {
    pub retriever: Retriever,
    pub generator: Generator,
    top_k: usize,
}

impl RagSystem {
    /// Build the index from the corpus and load the generator, reporting
    /// progress on `out`. Relative corpus paths resolve against `base`.
    pub fn load<W: Write>(base: &Path, settings: &Settings, out: &mut W) -> Result<Self> {
        writeln!(out, "📥 Loading Sanskrit documents...")?;
        let retriever = Retriever::from_settings(base, settings)?;

        let device = select_device();
        writeln!(out, "🤖 Loading LLM ({})...", device_label(&device))?;
        let generator = Generator::from_settings(&settings.generator, &device)?;

        writeln!(out, "\n✅ Sanskrit RAG System Ready!")?;
        writeln!(out, "Type 'exit' to quit.\n")?;
        Ok(Self { retriever, generator, top_k: settings.retriever.top_k })
    }

    pub fn top_k(&self) -> usize { self.top_k }

    pub fn session(&self) -> Session<'_, Retriever, Generator> { Session::new(&self.retriever, &self.generator, self.top_k) }
}
