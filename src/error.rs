// Typed errors for the descriptor pipeline.
//
// Input-shape and configuration errors are raised before any numeric work
// begins; numerical errors carry enough context to diagnose the failing
// stage without re-running it.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required column is absent from the input table.
    #[error("input is missing required column `{column}` (found: {found})")]
    MissingColumns { column: String, found: String },

    /// Every document was empty after grouping and token filtering.
    #[error("no documents survived filtering: every descriptor was empty after tokenization")]
    EmptyCorpus,

    #[error("topic count must be at least 1, got {0}")]
    InvalidTopicCount(usize),

    /// The multiplicative-update solver exhausted its iteration budget
    /// while the error was still improving faster than the tolerance.
    #[error(
        "factorization did not converge after {iterations} iterations \
         (reconstruction error {error:.6}, last relative improvement {improvement:.3e}, \
         tolerance {tolerance:.1e})"
    )]
    ConvergenceFailure {
        iterations: usize,
        error: f64,
        improvement: f64,
        tolerance: f64,
    },

    #[error("similarity threshold must lie in [0.0, 1.0], got {0}")]
    InvalidThreshold(f64),

    #[error("top-N edge count must be at least 1, got {0}")]
    InvalidN(usize),

    /// Row or column counts disagree between pipeline stages.
    #[error("{stage}: expected {expected} {unit}, got {actual}")]
    ShapeMismatch {
        stage: &'static str,
        unit: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A persisted stage artifact failed its load-time consistency checks.
    #[error("stage artifact is corrupt: {0}")]
    CorruptArtifact(String),

    #[error("failed to read input table: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to (de)serialize stage artifact: {0}")]
    Artifact(#[from] serde_json::Error),
}
