use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use sillage::artifacts::{self, MatrixArtifact, TopicsArtifact};
use sillage::config::{
    NetworkParams, DEFAULT_MAX_ITER, DEFAULT_MIN_TOKEN_LEN, DEFAULT_SEED, DEFAULT_THRESHOLD,
    DEFAULT_TOLERANCE, DEFAULT_TOPICS, DEFAULT_TOP_N,
};
use sillage::corpus::records;
use sillage::network::{self, export::ExportFormat};
use sillage::output::terminal;
use sillage::topics::{factorize, NmfParams};
use sillage::vectorize::TfIdfVectorizer;

/// Sillage: similarity networks for perfume descriptor corpora.
///
/// Turns a table of (brand, perfume_name, descriptors) records into a topic
/// model and a sparse similarity graph ready for network visualization.
#[derive(Parser)]
#[command(name = "sillage", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the TF-IDF matrix and perfume mapping from descriptor records
    Vectorize {
        /// Input CSV with brand, perfume_name, descriptors columns
        #[arg(long)]
        input: PathBuf,

        /// Where to write the matrix artifact (JSON)
        #[arg(long, default_value = "tfidf_matrix.json")]
        matrix: PathBuf,

        /// Where to write the doc_index -> perfume mapping (CSV)
        #[arg(long, default_value = "perfume_mapping.csv")]
        mapping: PathBuf,

        /// Extra stop words on top of the base English list, one per line
        #[arg(long)]
        stop_words: Option<PathBuf>,

        /// Drop tokens shorter than this many characters
        #[arg(long, default_value_t = DEFAULT_MIN_TOKEN_LEN)]
        min_token_len: usize,
    },

    /// Factorize the TF-IDF matrix into topic factors
    Reduce {
        /// Matrix artifact from the vectorize stage
        #[arg(long)]
        matrix: PathBuf,

        /// Number of topics (k)
        #[arg(long, default_value_t = DEFAULT_TOPICS)]
        topics: usize,

        /// Factorization seed; a fixed seed makes the factors reproducible
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Iteration budget for the solver
        #[arg(long, default_value_t = DEFAULT_MAX_ITER)]
        max_iter: usize,

        /// Relative-improvement convergence tolerance
        #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f64,

        /// Where to write the topics artifact (JSON)
        #[arg(long, default_value = "nmf_topics.json")]
        output: PathBuf,

        /// How many terms to print per topic
        #[arg(long, default_value_t = 10)]
        show_terms: usize,
    },

    /// Build and export the similarity network from topic factors
    Network {
        /// Topics artifact from the reduce stage
        #[arg(long)]
        topics_file: PathBuf,

        /// Mapping CSV from the vectorize stage
        #[arg(long)]
        mapping: PathBuf,

        /// Edges to keep per node
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top_n: usize,

        /// Similarity floor for keeping an edge
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,

        /// Where to write the graph
        #[arg(long, default_value = "perfume_network.gexf")]
        output: PathBuf,

        /// Export format
        #[arg(long, value_enum, default_value = "gexf")]
        format: Format,
    },

    /// Run the full pipeline in one pass
    Run {
        /// Input CSV with brand, perfume_name, descriptors columns
        #[arg(long)]
        input: PathBuf,

        /// Number of topics (k)
        #[arg(long, default_value_t = DEFAULT_TOPICS)]
        topics: usize,

        /// Edges to keep per node
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top_n: usize,

        /// Similarity floor for keeping an edge
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,

        /// Factorization seed
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Where to write the graph
        #[arg(long, default_value = "perfume_network.gexf")]
        output: PathBuf,

        /// Export format
        #[arg(long, value_enum, default_value = "gexf")]
        format: Format,
    },
}

/// CLI-facing export format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Gexf,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Gexf => ExportFormat::Gexf,
            Format::Json => ExportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sillage=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Vectorize {
            input,
            matrix,
            mapping,
            stop_words,
            min_token_len,
        } => {
            let records = records::load_records(&input)
                .with_context(|| format!("reading {}", input.display()))?;

            let mut vectorizer = TfIdfVectorizer::default();
            vectorizer.min_token_len = min_token_len;
            if let Some(path) = stop_words {
                let extra = fs::read_to_string(&path)
                    .with_context(|| format!("reading stop words from {}", path.display()))?;
                vectorizer.stop_words.extend(
                    extra
                        .lines()
                        .map(|line| line.trim().to_lowercase())
                        .filter(|line| !line.is_empty()),
                );
            }

            let corpus = vectorizer.fit_transform(&records)?;
            println!(
                "Vectorized {} perfumes into a {}x{} matrix ({} nonzeros).",
                corpus.documents.len(),
                corpus.matrix.rows(),
                corpus.matrix.cols(),
                corpus.matrix.nnz(),
            );

            artifacts::save_json(&MatrixArtifact::from_corpus(&corpus), &matrix)?;
            artifacts::save_mapping(&corpus.documents, &mapping)?;
            println!("Matrix artifact: {}", matrix.display());
            println!("Perfume mapping: {}", mapping.display());
        }

        Commands::Reduce {
            matrix,
            topics,
            seed,
            max_iter,
            tolerance,
            output,
            show_terms,
        } => {
            let params = NmfParams::new(topics)
                .seed(seed)
                .max_iter(max_iter)
                .tolerance(tolerance);
            params.validate()?;

            let artifact: MatrixArtifact = artifacts::load_json(&matrix)
                .with_context(|| format!("reading {}", matrix.display()))?;
            let corpus = artifact.into_corpus()?;

            let model = factorize(&corpus.matrix, &params)?;
            terminal::display_topics(&model, &corpus.vocabulary, show_terms);

            artifacts::save_json(
                &TopicsArtifact::from_model(&model, &corpus.vocabulary, seed),
                &output,
            )?;
            println!("Topics artifact: {}", output.display());
        }

        Commands::Network {
            topics_file,
            mapping,
            top_n,
            threshold,
            output,
            format,
        } => {
            let params = NetworkParams { top_n, threshold };
            params.validate()?;

            let artifact: TopicsArtifact = artifacts::load_json(&topics_file)
                .with_context(|| format!("reading {}", topics_file.display()))?;
            let documents = artifacts::load_mapping(&mapping)
                .with_context(|| format!("reading {}", mapping.display()))?;
            let w = artifact.doc_topic_matrix()?;

            let sim = network::pairwise(&w);
            let graph = network::build_from_similarity(&sim, &documents, &params)?;

            terminal::display_similarity_histogram(&sim);
            terminal::display_graph_summary(&graph, 10);

            network::export::write_graph(&graph, &output, format.into())?;
            println!("Graph exported to {}", output.display());
        }

        Commands::Run {
            input,
            topics,
            top_n,
            threshold,
            seed,
            output,
            format,
        } => {
            // All configuration is checked before the first stage runs.
            let nmf_params = NmfParams::new(topics).seed(seed);
            let net_params = NetworkParams { top_n, threshold };
            nmf_params.validate()?;
            net_params.validate()?;

            let records = records::load_records(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let corpus = TfIdfVectorizer::default().fit_transform(&records)?;
            println!(
                "Vectorized {} perfumes ({} terms).",
                corpus.documents.len(),
                corpus.vocabulary.len(),
            );

            let model = factorize(&corpus.matrix, &nmf_params)?;
            terminal::display_topics(&model, &corpus.vocabulary, 10);

            let sim = network::pairwise(&model.doc_topics);
            let graph = network::build_from_similarity(&sim, &corpus.documents, &net_params)?;

            terminal::display_similarity_histogram(&sim);
            terminal::display_graph_summary(&graph, 10);

            network::export::write_graph(&graph, &output, format.into())?;
            println!("Graph exported to {}", output.display());
        }
    }

    Ok(())
}
