// Operator-supplied pipeline parameters.
//
// Everything tunable is an explicit value passed into the stage that uses
// it, with no process-wide globals, so pipeline runs with different settings
// can coexist. Validation is eager: a bad value fails before any matrix work.

use crate::error::{PipelineError, Result};

/// Default topic count for the reduction stage.
pub const DEFAULT_TOPICS: usize = 10;
/// Default number of edges kept per node.
pub const DEFAULT_TOP_N: usize = 5;
/// Default similarity floor for edge retention.
pub const DEFAULT_THRESHOLD: f64 = 0.5;
/// Default factorization seed.
pub const DEFAULT_SEED: u64 = 42;
/// Default iteration budget for the factorization solver.
pub const DEFAULT_MAX_ITER: usize = 200;
/// Default relative-improvement tolerance for convergence.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;
/// Tokens shorter than this are dropped during vectorization.
pub const DEFAULT_MIN_TOKEN_LEN: usize = 2;

/// Parameters for the similarity network stage.
#[derive(Debug, Clone, Copy)]
pub struct NetworkParams {
    /// Edges to keep per node, ranked by similarity.
    pub top_n: usize,
    /// Minimum similarity for an edge to survive.
    pub threshold: f64,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl NetworkParams {
    /// Check both values before any pairwise computation starts.
    pub fn validate(&self) -> Result<()> {
        if self.top_n < 1 {
            return Err(PipelineError::InvalidN(self.top_n));
        }
        // NaN fails the range check too.
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(PipelineError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_valid() {
        assert!(NetworkParams::default().validate().is_ok());
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let params = NetworkParams {
            top_n: 5,
            threshold: f64::NAN,
        };
        assert!(params.validate().is_err());
    }
}
