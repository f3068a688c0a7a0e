use anyhow::Result;

use sanskrit_rag_core::config::DistanceMetric;
use sanskrit_rag_core::error::Error;

/// Brute-force index: every query is scored against every stored vector.
///
/// Vectors are stored row-major in one buffer. The dimensionality is fixed by
/// the first vector added.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    metric: DistanceMetric,
    dim: Option<usize>,
    data: Vec<f32>,
    norms: Vec<f32>,
}

impl FlatIndex {
    pub fn new(metric: DistanceMetric) -> Self { Self { metric, dim: None, data: Vec::new(), norms: Vec::new() } }

    pub fn dim(&self) -> Option<usize> { self.dim }
    pub fn len(&self) -> usize { self.norms.len() }
    pub fn is_empty(&self) -> bool { self.norms.is_empty() }

    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        let dim = *self.dim.get_or_insert(vector.len());
        if vector.len() != dim { return Err(Error::DimensionMismatch { expected: dim, got: vector.len() }.into()); }
        self.data.extend_from_slice(vector);
        self.norms.push(norm(vector));
        Ok(self.norms.len() - 1)
    }

    /// The `k` best `(position, score)` pairs, best first. Ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        let Some(dim) = self.dim else { return Ok(vec![]) };
        if query.len() != dim { return Err(Error::DimensionMismatch { expected: dim, got: query.len() }.into()); }
        let query_norm = norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(dim)
            .enumerate()
            .map(|(i, row)| (i, self.score(row, self.norms[i], query, query_norm)))
            .collect();
        match self.metric {
            DistanceMetric::L2 => scored.sort_by(|a, b| a.1.total_cmp(&b.1)),
            DistanceMetric::Cosine => scored.sort_by(|a, b| b.1.total_cmp(&a.1)),
        }
        scored.truncate(k);
        Ok(scored)
    }

    fn score(&self, row: &[f32], row_norm: f32, query: &[f32], query_norm: f32) -> f32 {
        match self.metric {
            DistanceMetric::L2 => row.iter().zip(query).map(|(a, b)| (a - b) * (a - b)).sum(),
            DistanceMetric::Cosine => {
                let denom = row_norm * query_norm;
                if denom < f32::EPSILON { return 0.0; }
                row.iter().zip(query).map(|(a, b)| a * b).sum::<f32>() / denom
            }
        }
    }
}

fn norm(v: &[f32]) -> f32 { v.iter().map(|x| x * x).sum::<f32>().sqrt() }
