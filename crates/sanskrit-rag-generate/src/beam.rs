//! Deterministic beam search over a step function.
//!
//! The step function receives the running sequences (all the same length,
//! each starting with the decoder start token) and returns one row of
//! log-probabilities over the vocabulary per sequence.

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct BeamSearchParams {
    pub num_beams: usize,
    pub max_new_tokens: usize,
    pub length_penalty: f32,
    pub start_token: u32,
    pub eos_token: u32,
}

#[derive(Debug, Clone)]
struct Hypothesis {
    tokens: Vec<u32>,
    score: f32,
}

struct Finished {
    capacity: usize,
    length_penalty: f32,
    hyps: Vec<Hypothesis>,
}

impl Finished {
    fn new(capacity: usize, length_penalty: f32) -> Self { Self { capacity, length_penalty, hyps: Vec::new() } }

    fn normalized(&self, sum_logprobs: f32, len: usize) -> f32 { sum_logprobs / (len.max(1) as f32).powf(self.length_penalty) }

    fn add(&mut self, tokens: Vec<u32>, sum_logprobs: f32, len: usize) {
        let score = self.normalized(sum_logprobs, len);
        self.hyps.push(Hypothesis { tokens, score });
        self.hyps.sort_by(|a, b| b.score.total_cmp(&a.score));
        self.hyps.truncate(self.capacity);
    }

    fn worst(&self) -> Option<f32> { self.hyps.last().map(|h| h.score) }

    /// No running beam can still beat the worst kept hypothesis.
    ///
    /// `best_running_sum` is the best beam still running after this step.
    /// Candidates that ended with EOS on this step are already in `hyps` and
    /// do not count, so this can stop one step later than a check over every
    /// candidate of the step would.
    fn is_done(&self, best_running_sum: f32, cur_len: usize) -> bool {
        if self.hyps.len() < self.capacity { return false; }
        match self.worst() {
            Some(worst) => worst >= self.normalized(best_running_sum, cur_len),
            None => false,
        }
    }

    fn best(self) -> Option<Hypothesis> { self.hyps.into_iter().next() }
}

struct Beam {
    tokens: Vec<u32>,
    sum_logprobs: f32,
}

/// Run beam search and return the generated tokens of the best hypothesis,
/// without the start token and without the closing EOS.
pub fn beam_search<F>(params: &BeamSearchParams, mut step: F) -> Result<Vec<u32>>
where
    F: FnMut(&[Vec<u32>]) -> Result<Vec<Vec<f32>>>,
{
    let num_beams = params.num_beams.max(1);
    let mut finished = Finished::new(num_beams, params.length_penalty);
    let mut beams = vec![Beam { tokens: vec![params.start_token], sum_logprobs: 0.0 }];

    for cur_len in 1..=params.max_new_tokens {
        let seqs: Vec<Vec<u32>> = beams.iter().map(|b| b.tokens.clone()).collect();
        let log_probs = step(&seqs)?;
        if log_probs.len() != beams.len() {
            anyhow::bail!("step returned {} rows for {} beams", log_probs.len(), beams.len());
        }

        let mut candidates: Vec<(f32, usize, u32)> = Vec::new();
        for (b, row) in log_probs.iter().enumerate() {
            let base = beams[b].sum_logprobs;
            candidates.extend(row.iter().enumerate().map(|(tok, lp)| (base + lp, b, tok as u32)));
        }
        let keep = (2 * num_beams).min(candidates.len());
        if keep == 0 { break; }
        if keep < candidates.len() {
            candidates.select_nth_unstable_by(keep - 1, |a, b| b.0.total_cmp(&a.0));
            candidates.truncate(keep);
        }
        // Stable order for equal scores: beam, then token.
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

        let mut next = Vec::with_capacity(num_beams);
        for (rank, &(score, b, tok)) in candidates.iter().enumerate() {
            if tok == params.eos_token {
                if rank < num_beams { finished.add(beams[b].tokens[1..].to_vec(), score, cur_len); }
            } else {
                let mut tokens = beams[b].tokens.clone();
                tokens.push(tok);
                next.push(Beam { tokens, sum_logprobs: score });
            }
            if next.len() == num_beams { break; }
        }
        if next.is_empty() { beams.clear(); break; }
        beams = next;
        if finished.is_done(beams[0].sum_logprobs, cur_len) { beams.clear(); break; }
    }

    // Hit the token limit: unfinished beams compete with the finished ones.
    for beam in beams {
        let len = beam.tokens.len() - 1;
        finished.add(beam.tokens[1..].to_vec(), beam.sum_logprobs, len);
    }
    Ok(finished.best().map(|h| h.tokens).unwrap_or_default())
}
