// Pairwise cosine similarity over document-topic rows.
//
// The full matrix is O(d^2) in document count, which is what bounds the
// practical corpus size for this design. Rows are independent, so they are
// computed in parallel with read-only access to W.

use ndarray::Array2;
use rayon::prelude::*;

/// Dense pairwise similarity with zero-vector bookkeeping.
///
/// `defined[i]` is false when row `i` of W is the zero vector: its scores
/// are stored as 0.0, but the document must not gain edges from either
/// direction; it becomes an isolated node, not an error. The diagonal is
/// 0.0 and is never a candidate.
#[derive(Debug, Clone)]
pub struct PairwiseSimilarity {
    pub scores: Array2<f64>,
    pub defined: Vec<bool>,
}

impl PairwiseSimilarity {
    pub fn len(&self) -> usize {
        self.defined.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defined.is_empty()
    }

    /// Upper-triangle scores (i < j), for distribution reporting.
    pub fn upper_triangle(&self) -> Vec<f64> {
        let d = self.len();
        let mut scores = Vec::with_capacity(d.saturating_sub(1) * d / 2);
        for i in 0..d {
            for j in (i + 1)..d {
                scores.push(self.scores[[i, j]]);
            }
        }
        scores
    }
}

/// Compute cosine similarity between every pair of rows of `w`.
///
/// Scores are clamped at 1.0 to absorb floating-point overshoot on
/// near-identical rows. Symmetry is exact: both orders evaluate the same
/// dot product over the same index sequence.
pub fn pairwise(w: &Array2<f64>) -> PairwiseSimilarity {
    let d = w.nrows();
    let norms: Vec<f64> = (0..d).map(|i| w.row(i).dot(&w.row(i)).sqrt()).collect();
    let defined: Vec<bool> = norms.iter().map(|&norm| norm > 0.0).collect();

    let rows: Vec<Vec<f64>> = (0..d)
        .into_par_iter()
        .map(|i| {
            (0..d)
                .map(|j| {
                    if i == j || norms[i] == 0.0 || norms[j] == 0.0 {
                        0.0
                    } else {
                        (w.row(i).dot(&w.row(j)) / (norms[i] * norms[j])).min(1.0)
                    }
                })
                .collect()
        })
        .collect();

    let mut scores = Array2::zeros((d, d));
    for (i, row) in rows.into_iter().enumerate() {
        for (j, score) in row.into_iter().enumerate() {
            scores[[i, j]] = score;
        }
    }

    PairwiseSimilarity { scores, defined }
}
