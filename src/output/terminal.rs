// Colored terminal output for stage summaries.
//
// All terminal-specific formatting lives here: histograms, topic tables,
// graph summaries. main.rs delegates to these after each stage.

use colored::Colorize;
use petgraph::visit::EdgeRef;

use crate::network::{PairwiseSimilarity, SimilarityGraph};
use crate::topics::TopicModel;
use crate::vectorize::Vocabulary;

const HISTOGRAM_BINS: usize = 10;
const BAR_WIDTH: usize = 40;

/// Histogram of pairwise similarity scores over [0, 1].
///
/// This distribution is what an operator looks at when picking the
/// similarity threshold: a long right tail means a high floor still keeps
/// edges, a tight unimodal blob means it will not.
pub fn display_similarity_histogram(sim: &PairwiseSimilarity) {
    let scores = sim.upper_triangle();
    if scores.is_empty() {
        println!("No document pairs to summarize.");
        return;
    }

    let mut counts = [0usize; HISTOGRAM_BINS];
    for &score in &scores {
        let bin = ((score * HISTOGRAM_BINS as f64) as usize).min(HISTOGRAM_BINS - 1);
        counts[bin] += 1;
    }
    let max_count = counts.iter().copied().max().unwrap_or(0).max(1);

    println!(
        "\n{}",
        format!("=== Similarity distribution ({} pairs) ===", scores.len()).bold()
    );
    println!();
    for (bin, &count) in counts.iter().enumerate() {
        let lo = bin as f64 / HISTOGRAM_BINS as f64;
        let hi = lo + 1.0 / HISTOGRAM_BINS as f64;
        let filled = if count == 0 {
            0
        } else {
            ((count as f64 / max_count as f64) * BAR_WIDTH as f64).ceil() as usize
        };
        let bar = format!("{:<width$}", "#".repeat(filled), width = BAR_WIDTH);
        println!(
            "  {lo:.1}-{hi:.1}  {} {}",
            bar.bright_blue(),
            count.to_string().dimmed()
        );
    }
    println!();
}

/// Each topic's heaviest terms, printed after the reduction stage.
pub fn display_topics(model: &TopicModel, vocabulary: &Vocabulary, terms_per_topic: usize) {
    println!(
        "\n{}",
        format!("=== {} topics ===", model.n_topics()).bold()
    );
    println!();
    for topic in 0..model.n_topics() {
        let terms = model.top_terms(topic, terms_per_topic, vocabulary);
        let rendered: Vec<String> = terms
            .iter()
            .map(|(term, weight)| format!("{term} ({weight:.3})"))
            .collect();
        println!("  {:>3}. {}", topic, rendered.join(", "));
    }
    println!(
        "\n  {} iterations, reconstruction error {:.4}\n",
        model.iterations, model.reconstruction_err
    );
}

/// Node/edge counts plus the strongest connections.
pub fn display_graph_summary(graph: &SimilarityGraph, show_top: usize) {
    println!(
        "\n{}",
        format!(
            "=== Similarity network: {} nodes, {} edges ===",
            graph.node_count(),
            graph.edge_count()
        )
        .bold()
    );

    let isolated = graph
        .node_indices()
        .filter(|&node| graph.edges(node).next().is_none())
        .count();
    if isolated > 0 {
        println!(
            "  {} {isolated} isolated perfumes (nothing above the similarity floor)",
            "~".yellow()
        );
    }

    let mut edges: Vec<(String, String, f64)> = graph
        .edge_references()
        .map(|edge| {
            (
                graph[edge.source()].label(),
                graph[edge.target()].label(),
                *edge.weight(),
            )
        })
        .collect();
    edges.sort_by(|a, b| b.2.total_cmp(&a.2));

    if !edges.is_empty() {
        println!("\n  Strongest connections:");
        for (a, b, weight) in edges.iter().take(show_top) {
            let colored_weight = if *weight >= 0.9 {
                format!("{weight:.3}").bright_green()
            } else if *weight >= 0.7 {
                format!("{weight:.3}").bright_yellow()
            } else {
                format!("{weight:.3}").normal()
            };
            println!("    {colored_weight}  {}  <->  {}", a.bold(), b);
        }
    }
    println!();
}
