// Graph assembly: one node per document, merged candidate edges.

use ndarray::Array2;
use petgraph::graph::{NodeIndex, UnGraph};
use tracing::info;

use crate::config::NetworkParams;
use crate::error::{PipelineError, Result};
use crate::vectorize::DocumentLabel;

use super::select::{merge_edges, select_edges};
use super::similarity::{pairwise, PairwiseSimilarity};

/// Node payload: the document's identity and its stable index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfumeNode {
    pub doc_index: usize,
    pub brand: String,
    pub name: String,
}

impl PerfumeNode {
    /// Display label, `"brand - name"`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.brand, self.name)
    }
}

/// Undirected simple graph over documents; edge weight = cosine similarity.
pub type SimilarityGraph = UnGraph<PerfumeNode, f64>;

/// Build the similarity graph from the document-topic matrix.
///
/// Parameters are validated before the pairwise computation starts. Nodes
/// are inserted in `doc_index` order, so `NodeIndex::new(i)` is the node
/// for document `i`. An empty `w` yields an empty graph, not an error.
pub fn build_graph(
    w: &Array2<f64>,
    labels: &[DocumentLabel],
    params: &NetworkParams,
) -> Result<SimilarityGraph> {
    params.validate()?;
    check_alignment(w.nrows(), labels.len())?;
    let sim = pairwise(w);
    build_from_similarity(&sim, labels, params)
}

/// Assemble the graph from precomputed similarities.
///
/// Split out from `build_graph` so a caller can reuse the similarity
/// matrix for reporting without paying for it twice.
pub fn build_from_similarity(
    sim: &PairwiseSimilarity,
    labels: &[DocumentLabel],
    params: &NetworkParams,
) -> Result<SimilarityGraph> {
    params.validate()?;
    check_alignment(sim.len(), labels.len())?;

    let mut graph =
        SimilarityGraph::with_capacity(labels.len(), labels.len() * params.top_n);
    for (doc_index, label) in labels.iter().enumerate() {
        graph.add_node(PerfumeNode {
            doc_index,
            brand: label.brand.clone(),
            name: label.name.clone(),
        });
    }

    let candidates = select_edges(sim, params)?;
    let edges = merge_edges(&candidates);
    for (&(i, j), &weight) in &edges {
        graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), weight);
    }

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Built similarity network"
    );
    Ok(graph)
}

fn check_alignment(rows: usize, labels: usize) -> Result<()> {
    if rows != labels {
        return Err(PipelineError::ShapeMismatch {
            stage: "similarity network",
            unit: "document labels",
            expected: rows,
            actual: labels,
        });
    }
    Ok(())
}
