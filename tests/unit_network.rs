// Unit tests for the similarity network: symmetry, edge policy invariants,
// dedup, zero-vector handling, and eager parameter validation.

use std::collections::HashSet;

use ndarray::array;
use petgraph::visit::EdgeRef;
use sillage::config::NetworkParams;
use sillage::error::PipelineError;
use sillage::network::{build_graph, merge_edges, pairwise, select_edges};
use sillage::vectorize::DocumentLabel;

fn labels(count: usize) -> Vec<DocumentLabel> {
    (0..count)
        .map(|i| DocumentLabel {
            brand: format!("Brand{i}"),
            name: format!("Perfume{i}"),
        })
        .collect()
}

// ============================================================
// Pairwise similarity
// ============================================================

#[test]
fn similarity_is_symmetric() {
    let w = array![
        [0.9, 0.1, 0.0],
        [0.2, 0.7, 0.1],
        [0.0, 0.3, 0.6],
        [0.4, 0.4, 0.2],
    ];
    let sim = pairwise(&w);
    for i in 0..4 {
        for j in 0..4 {
            assert!(
                (sim.scores[[i, j]] - sim.scores[[j, i]]).abs() < 1e-12,
                "S[{i}][{j}] != S[{j}][{i}]"
            );
        }
    }
}

#[test]
fn weights_never_exceed_one() {
    let w = array![[0.3, 0.3], [0.3, 0.3], [0.6, 0.6]];
    let sim = pairwise(&w);
    for score in sim.upper_triangle() {
        assert!(score <= 1.0, "Score {score} exceeds 1.0");
    }
}

// ============================================================
// Edge policy
// ============================================================

#[test]
fn out_degree_is_bounded_by_top_n() {
    let w = array![
        [1.0, 0.0],
        [0.9, 0.1],
        [0.8, 0.2],
        [0.7, 0.3],
        [0.6, 0.4],
    ];
    let sim = pairwise(&w);
    let params = NetworkParams {
        top_n: 2,
        threshold: 0.0,
    };
    let candidates = select_edges(&sim, &params).unwrap();
    for source in 0..5 {
        let proposed = candidates.iter().filter(|c| c.source == source).count();
        assert!(proposed <= 2, "Node {source} proposed {proposed} edges");
    }
}

#[test]
fn all_edge_weights_clear_the_threshold() {
    let w = array![[1.0, 0.0], [0.8, 0.6], [0.0, 1.0]];
    let params = NetworkParams {
        top_n: 2,
        threshold: 0.7,
    };
    let graph = build_graph(&w, &labels(3), &params).unwrap();
    for edge in graph.edge_references() {
        assert!(*edge.weight() >= 0.7);
        assert!(*edge.weight() <= 1.0);
    }
}

#[test]
fn no_self_loops_and_no_duplicate_edges() {
    let w = array![
        [0.5, 0.5],
        [0.5, 0.5],
        [0.4, 0.6],
        [0.6, 0.4],
    ];
    let params = NetworkParams {
        top_n: 3,
        threshold: 0.0,
    };
    let graph = build_graph(&w, &labels(4), &params).unwrap();

    let mut seen = HashSet::new();
    for edge in graph.edge_references() {
        let a = edge.source().index();
        let b = edge.target().index();
        assert_ne!(a, b, "Self-loop at node {a}");
        assert!(
            seen.insert((a.min(b), a.max(b))),
            "Duplicate edge {{{a}, {b}}}"
        );
    }
}

#[test]
fn top_n_beyond_corpus_size_selects_everything() {
    let w = array![[1.0, 0.0], [0.9, 0.1], [0.8, 0.2]];
    let params = NetworkParams {
        top_n: 10,
        threshold: 0.0,
    };
    let graph = build_graph(&w, &labels(3), &params).unwrap();
    // Every pair qualifies at threshold 0.0.
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn zero_vector_document_is_an_isolated_node() {
    let w = array![[1.0, 0.0], [0.9, 0.1], [0.0, 0.0]];
    let params = NetworkParams {
        top_n: 5,
        threshold: 0.0,
    };
    let graph = build_graph(&w, &labels(3), &params).unwrap();

    assert_eq!(graph.node_count(), 3);
    let zero_node = petgraph::graph::NodeIndex::new(2);
    assert_eq!(graph.edges(zero_node).count(), 0);
    // The other two still connect to each other.
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn empty_input_yields_empty_graph() {
    let w = ndarray::Array2::<f64>::zeros((0, 3));
    let params = NetworkParams {
        top_n: 5,
        threshold: 0.5,
    };
    let graph = build_graph(&w, &labels(0), &params).unwrap();
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.edge_count(), 0);
}

// ============================================================
// Node attributes and validation
// ============================================================

#[test]
fn nodes_carry_brand_and_name_in_index_order() {
    let w = array![[1.0, 0.0], [0.0, 1.0]];
    let params = NetworkParams {
        top_n: 1,
        threshold: 0.0,
    };
    let graph = build_graph(&w, &labels(2), &params).unwrap();
    for (i, node) in graph.node_weights().enumerate() {
        assert_eq!(node.doc_index, i);
        assert_eq!(node.brand, format!("Brand{i}"));
        assert_eq!(node.name, format!("Perfume{i}"));
    }
}

#[test]
fn label_count_mismatch_is_a_shape_error() {
    let w = array![[1.0, 0.0], [0.0, 1.0]];
    let params = NetworkParams {
        top_n: 1,
        threshold: 0.0,
    };
    assert!(matches!(
        build_graph(&w, &labels(3), &params),
        Err(PipelineError::ShapeMismatch { .. })
    ));
}

#[test]
fn out_of_range_parameters_fail_before_computation() {
    let w = array![[1.0, 0.0], [0.0, 1.0]];
    assert!(matches!(
        build_graph(
            &w,
            &labels(2),
            &NetworkParams {
                top_n: 0,
                threshold: 0.5
            }
        ),
        Err(PipelineError::InvalidN(0))
    ));
    assert!(matches!(
        build_graph(
            &w,
            &labels(2),
            &NetworkParams {
                top_n: 1,
                threshold: -0.1
            }
        ),
        Err(PipelineError::InvalidThreshold(_))
    ));
}

// ============================================================
// Dedup merge
// ============================================================

#[test]
fn mutual_selection_creates_one_edge() {
    // Two near-identical documents pick each other; the merged edge list
    // must contain the pair exactly once.
    let w = array![[0.5, 0.5], [0.5, 0.5]];
    let sim = pairwise(&w);
    let params = NetworkParams {
        top_n: 1,
        threshold: 0.0,
    };
    let candidates = select_edges(&sim, &params).unwrap();
    assert_eq!(candidates.len(), 2);
    let edges = merge_edges(&candidates);
    assert_eq!(edges.len(), 1);
}
