//! The interactive question loop.
//!
//! Two states: `AwaitingInput` and `Terminated`. The command `exit`
//! (case-insensitive, surrounding whitespace ignored) or end of input
//! terminates; every other line, including an empty one, runs one
//! retrieve-then-generate turn. Errors from a turn end the session.

use anyhow::Result;
use std::io::{BufRead, Write};

use sanskrit_rag_core::traits::{AnswerGenerator, ContextRetriever};

pub const PROMPT: &str = "🧑‍💻 प्रश्नः: ";
pub const FAREWELL: &str = "👋 समाप्तम्।";
pub const EXIT_COMMAND: &str = "exit";
pub const SEPARATOR_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Exit,
    Ask(&'a str),
}

pub fn parse_command(line: &str) -> Command<'_> {
    let question = line.trim();
    if question.eq_ignore_ascii_case(EXIT_COMMAND) { Command::Exit } else { Command::Ask(question) }
}

pub fn separator() -> String { "-".repeat(SEPARATOR_WIDTH) }

pub struct Session<'a, R: ?Sized, G: ?Sized> {
    retriever: &'a R,
    generator: &'a G,
    top_k: usize,
    state: SessionState,
    turns: usize,
}

impl<'a, R, G> Session<'a, R, G>
where
    R: ContextRetriever + ?Sized,
    G: AnswerGenerator + ?Sized,
{
    pub fn new(retriever: &'a R, generator: &'a G, top_k: usize) -> Self {
        Self { retriever, generator, top_k, state: SessionState::AwaitingInput, turns: 0 }
    }

    pub fn state(&self) -> SessionState { self.state }
    pub fn turns(&self) -> usize { self.turns }

    /// Handle one input line, writing the transcript for the turn to `out`.
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<SessionState> {
        if self.state == SessionState::Terminated { return Ok(self.state); }
        match parse_command(line) {
            Command::Exit => {
                writeln!(out, "{FAREWELL}")?;
                self.state = SessionState::Terminated;
            }
            Command::Ask(question) => {
                let context = self.retriever.get_context(question, self.top_k)?;
                writeln!(out, "\n🔍 Retrieved Context:\n")?;
                writeln!(out, "{context}")?;
                writeln!(out, "\n{}", separator())?;
                out.flush()?;

                let answer = self.generator.generate(&context, question)?;
                writeln!(out, "\n📜 उत्तरम्:")?;
                writeln!(out, "{answer}")?;
                writeln!(out, "{}", separator())?;
                self.turns += 1;
                tracing::debug!(turn = self.turns, context_chars = context.chars().count(), "turn complete");
            }
        }
        Ok(self.state)
    }

    /// Prompt, read and handle lines until `exit` or end of input.
    pub fn run<B: BufRead, W: Write>(&mut self, mut input: B, mut out: W) -> Result<()> {
        while self.state == SessionState::AwaitingInput {
            write!(out, "{PROMPT}")?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                self.state = SessionState::Terminated;
                break;
            }
            self.handle_line(&line, &mut out)?;
        }
        out.flush()?;
        Ok(())
    }
}
