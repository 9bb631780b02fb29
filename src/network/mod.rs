// Similarity network construction: cosine similarity over topic profiles,
// top-N edge selection, graph assembly, and export.

pub mod builder;
pub mod export;
pub mod select;
pub mod similarity;

pub use builder::{build_from_similarity, build_graph, PerfumeNode, SimilarityGraph};
pub use select::{merge_edges, select_edges, CandidateEdge};
pub use similarity::{pairwise, PairwiseSimilarity};
