// Nonnegative matrix factorization via multiplicative updates
// (Lee & Seung, 2001).
//
// Factorizes the term-document matrix V (docs x terms) into W (docs x k)
// and H (k x terms), minimizing the squared Frobenius reconstruction error.
// V is only touched through its nonzeros, so one iteration costs
// O(nnz * k) plus small k x k products; the dense docs x terms product is
// never materialized, not even for the error evaluation.

use ndarray::{Array2, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sprs::CsMat;
use tracing::{debug, info};

use crate::config::{DEFAULT_MAX_ITER, DEFAULT_SEED, DEFAULT_TOLERANCE};
use crate::error::{PipelineError, Result};
use crate::vectorize::Vocabulary;

/// Guard against division by zero in the update denominators.
const EPS: f64 = 1e-10;
/// Reconstruction error is evaluated every this many iterations.
const CONV_CHECK_EVERY: usize = 10;

/// Solver parameters. The factorization is a pure function of
/// `(matrix, params)`: identical inputs give bitwise-identical factors.
#[derive(Debug, Clone, Copy)]
pub struct NmfParams {
    pub n_topics: usize,
    pub max_iter: usize,
    /// Convergence tolerance on the error improvement, relative to the
    /// initial error.
    pub tolerance: f64,
    pub seed: u64,
}

impl NmfParams {
    pub fn new(n_topics: usize) -> Self {
        Self {
            n_topics,
            max_iter: DEFAULT_MAX_ITER,
            tolerance: DEFAULT_TOLERANCE,
            seed: DEFAULT_SEED,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Eager configuration check, usable before any stage has run.
    pub fn validate(&self) -> Result<()> {
        if self.n_topics < 1 {
            return Err(PipelineError::InvalidTopicCount(self.n_topics));
        }
        Ok(())
    }
}

/// The factorization output.
#[derive(Debug, Clone)]
pub struct TopicModel {
    /// W: one row per document, one column per topic.
    pub doc_topics: Array2<f64>,
    /// H: one row per topic, one column per vocabulary term.
    pub topic_terms: Array2<f64>,
    /// Iterations actually run.
    pub iterations: usize,
    /// Final Frobenius reconstruction error.
    pub reconstruction_err: f64,
}

impl TopicModel {
    pub fn n_topics(&self) -> usize {
        self.doc_topics.ncols()
    }

    /// The `n` heaviest terms of one topic, for interpretability.
    pub fn top_terms<'a>(
        &self,
        topic: usize,
        n: usize,
        vocabulary: &'a Vocabulary,
    ) -> Vec<(&'a str, f64)> {
        if topic >= self.topic_terms.nrows() {
            return Vec::new();
        }
        let row = self.topic_terms.row(topic);
        let mut ranked: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .take(n)
            .filter_map(|(column, weight)| vocabulary.term(column).map(|term| (term, weight)))
            .collect()
    }
}

/// Factorize the term-document matrix into nonnegative topic factors.
///
/// Initialization draws from `StdRng::seed_from_u64(params.seed)`, uniform
/// entries scaled by `sqrt(mean(V) / k)`. Convergence is declared when the
/// error improvement relative to the initial error drops below the
/// tolerance; exhausting the iteration budget first is a hard
/// `ConvergenceFailure`, never a silently accepted result.
pub fn factorize(matrix: &CsMat<f64>, params: &NmfParams) -> Result<TopicModel> {
    params.validate()?;

    let n_docs = matrix.rows();
    let n_terms = matrix.cols();
    let k = params.n_topics;

    // Squared Frobenius norm of V, reused in every error evaluation.
    let v_norm_sq: f64 = matrix.data().iter().map(|v| v * v).sum();

    let mean = if n_docs * n_terms > 0 {
        matrix.data().iter().sum::<f64>() / (n_docs * n_terms) as f64
    } else {
        0.0
    };
    let scale = (mean / k as f64).sqrt().max(EPS);
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut w = Array2::from_shape_fn((n_docs, k), |_| rng.random::<f64>() * scale);
    let mut h = Array2::from_shape_fn((k, n_terms), |_| rng.random::<f64>() * scale);

    let initial_err = reconstruction_error(matrix, &w, &h, v_norm_sq);
    let mut previous_err = initial_err;
    let mut final_err = initial_err;
    let mut last_improvement = f64::INFINITY;
    // An empty matrix has nothing to fit.
    let mut converged = matrix.nnz() == 0;
    let mut iterations = 0;

    while iterations < params.max_iter && !converged {
        iterations += 1;

        // H <- H * (W^T V) / (W^T W H)
        let wt_v = left_product(matrix, &w);
        let wt_w_h = w.t().dot(&w).dot(&h);
        Zip::from(&mut h)
            .and(&wt_v)
            .and(&wt_w_h)
            .for_each(|entry, &numerator, &denominator| {
                *entry *= numerator / (denominator + EPS);
            });

        // W <- W * (V H^T) / (W H H^T)
        let v_ht = right_product(matrix, &h);
        let w_h_ht = w.dot(&h.dot(&h.t()));
        Zip::from(&mut w)
            .and(&v_ht)
            .and(&w_h_ht)
            .for_each(|entry, &numerator, &denominator| {
                *entry *= numerator / (denominator + EPS);
            });

        if iterations % CONV_CHECK_EVERY == 0 || iterations == params.max_iter {
            final_err = reconstruction_error(matrix, &w, &h, v_norm_sq);
            last_improvement = if initial_err > 0.0 {
                (previous_err - final_err) / initial_err
            } else {
                0.0
            };
            debug!(
                iterations,
                error = final_err,
                improvement = last_improvement,
                "Factorization progress"
            );
            if last_improvement < params.tolerance {
                converged = true;
            }
            previous_err = final_err;
        }
    }

    if !converged {
        return Err(PipelineError::ConvergenceFailure {
            iterations,
            error: final_err,
            improvement: last_improvement,
            tolerance: params.tolerance,
        });
    }

    info!(
        topics = k,
        iterations,
        error = final_err,
        "Factorized term-document matrix"
    );

    Ok(TopicModel {
        doc_topics: w,
        topic_terms: h,
        iterations,
        reconstruction_err: final_err,
    })
}

/// W^T · V, touching only V's nonzeros.
fn left_product(matrix: &CsMat<f64>, w: &Array2<f64>) -> Array2<f64> {
    let k = w.ncols();
    let mut out = Array2::zeros((k, matrix.cols()));
    for (row, row_vec) in matrix.outer_iterator().enumerate() {
        for (column, &value) in row_vec.iter() {
            for topic in 0..k {
                out[[topic, column]] += w[[row, topic]] * value;
            }
        }
    }
    out
}

/// V · H^T, touching only V's nonzeros.
fn right_product(matrix: &CsMat<f64>, h: &Array2<f64>) -> Array2<f64> {
    let k = h.nrows();
    let mut out = Array2::zeros((matrix.rows(), k));
    for (row, row_vec) in matrix.outer_iterator().enumerate() {
        for (column, &value) in row_vec.iter() {
            for topic in 0..k {
                out[[row, topic]] += value * h[[topic, column]];
            }
        }
    }
    out
}

/// ||V - W·H||_F via the trace expansion
/// ||V||^2 - 2<V, WH> + sum((W^T W) ∘ (H H^T)).
fn reconstruction_error(
    matrix: &CsMat<f64>,
    w: &Array2<f64>,
    h: &Array2<f64>,
    v_norm_sq: f64,
) -> f64 {
    let mut cross = 0.0;
    for (row, row_vec) in matrix.outer_iterator().enumerate() {
        for (column, &value) in row_vec.iter() {
            cross += value * w.row(row).dot(&h.column(column));
        }
    }
    let wt_w = w.t().dot(w);
    let h_ht = h.dot(&h.t());
    let wh_norm_sq = (&wt_w * &h_ht).sum();

    (v_norm_sq - 2.0 * cross + wh_norm_sq).max(0.0).sqrt()
}
