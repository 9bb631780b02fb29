// Top-N edge selection: a pure two-pass filter (rank, then prune) producing
// candidate edges, followed by a deduplicating merge. Keeping selection and
// merge separate makes the no-duplicate-edge invariant checkable without
// reasoning about iteration order.

use std::collections::BTreeMap;

use crate::config::NetworkParams;
use crate::error::Result;

use super::similarity::PairwiseSimilarity;

/// A directional selection proposal: `source` ranked `target` inside its
/// top-N and the score cleared the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

/// Rank every node's neighbors and keep the top N at or above the threshold.
///
/// Ties break by ascending target index so the selection is reproducible.
/// Zero-vector documents neither propose nor receive candidates. A `top_n`
/// larger than `d - 1` selects every other document, still subject to the
/// threshold.
pub fn select_edges(
    sim: &PairwiseSimilarity,
    params: &NetworkParams,
) -> Result<Vec<CandidateEdge>> {
    params.validate()?;

    let d = sim.len();
    let mut candidates = Vec::new();
    for source in 0..d {
        if !sim.defined[source] {
            continue;
        }
        let mut ranked: Vec<(usize, f64)> = (0..d)
            .filter(|&target| target != source && sim.defined[target])
            .map(|target| (target, sim.scores[[source, target]]))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        for &(target, weight) in ranked.iter().take(params.top_n) {
            if weight >= params.threshold {
                candidates.push(CandidateEdge {
                    source,
                    target,
                    weight,
                });
            }
        }
    }
    Ok(candidates)
}

/// Merge directional candidates into unordered edges.
///
/// Keyed by the ordered `(min, max)` pair; the first insertion wins and a
/// later proposal for the same pair is ignored rather than overwritten.
/// The weight is symmetric, so both directions agree on it.
pub fn merge_edges(candidates: &[CandidateEdge]) -> BTreeMap<(usize, usize), f64> {
    let mut edges = BTreeMap::new();
    for candidate in candidates {
        let key = (
            candidate.source.min(candidate.target),
            candidate.source.max(candidate.target),
        );
        edges.entry(key).or_insert(candidate.weight);
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use ndarray::{array, Array2};

    fn sim_from(scores: Array2<f64>) -> PairwiseSimilarity {
        let defined = vec![true; scores.nrows()];
        PairwiseSimilarity { scores, defined }
    }

    #[test]
    fn ties_break_by_ascending_index() {
        // Node 0 sees 0.8 at both 1 and 2; top-1 must pick node 1.
        let sim = sim_from(array![
            [0.0, 0.8, 0.8],
            [0.8, 0.0, 0.1],
            [0.8, 0.1, 0.0],
        ]);
        let params = NetworkParams {
            top_n: 1,
            threshold: 0.0,
        };
        let candidates = select_edges(&sim, &params).unwrap();
        let from_zero: Vec<_> = candidates.iter().filter(|c| c.source == 0).collect();
        assert_eq!(from_zero.len(), 1);
        assert_eq!(from_zero[0].target, 1);
    }

    #[test]
    fn threshold_prunes_after_ranking() {
        let sim = sim_from(array![
            [0.0, 0.9, 0.4],
            [0.9, 0.0, 0.2],
            [0.4, 0.2, 0.0],
        ]);
        let params = NetworkParams {
            top_n: 2,
            threshold: 0.5,
        };
        let candidates = select_edges(&sim, &params).unwrap();
        assert!(candidates.iter().all(|c| c.weight >= 0.5));
        // Node 2's best score is 0.4, below the floor: it proposes nothing.
        assert!(candidates.iter().all(|c| c.source != 2));
    }

    #[test]
    fn undefined_nodes_propose_and_receive_nothing() {
        let mut sim = sim_from(array![
            [0.0, 0.0, 0.7],
            [0.0, 0.0, 0.0],
            [0.7, 0.0, 0.0],
        ]);
        sim.defined[1] = false;
        let params = NetworkParams {
            top_n: 5,
            threshold: 0.0,
        };
        let candidates = select_edges(&sim, &params).unwrap();
        assert!(candidates.iter().all(|c| c.source != 1 && c.target != 1));
    }

    #[test]
    fn merge_keeps_one_edge_per_pair() {
        let candidates = vec![
            CandidateEdge {
                source: 0,
                target: 1,
                weight: 0.9,
            },
            CandidateEdge {
                source: 1,
                target: 0,
                weight: 0.9,
            },
        ];
        let edges = merge_edges(&candidates);
        assert_eq!(edges.len(), 1);
        assert!((edges[&(0, 1)] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn invalid_params_rejected_before_selection() {
        let sim = sim_from(Array2::zeros((2, 2)));
        assert!(matches!(
            select_edges(
                &sim,
                &NetworkParams {
                    top_n: 0,
                    threshold: 0.5
                }
            ),
            Err(PipelineError::InvalidN(0))
        ));
        assert!(matches!(
            select_edges(
                &sim,
                &NetworkParams {
                    top_n: 1,
                    threshold: 1.5
                }
            ),
            Err(PipelineError::InvalidThreshold(_))
        ));
    }
}
