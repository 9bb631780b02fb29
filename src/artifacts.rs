// Stage artifacts: the on-disk contract that lets vectorize, reduce, and
// network run as separate invocations.
//
// Matrices are stored as JSON (triplets for the sparse matrix, nested rows
// for the dense factors). The document mapping is a plain CSV so downstream
// consumers can join on doc_index without JSON tooling.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::topics::TopicModel;
use crate::vectorize::{DocumentLabel, VectorizedCorpus, Vocabulary};

/// Persisted form of the vectorization stage output.
#[derive(Debug, Serialize, Deserialize)]
pub struct MatrixArtifact {
    pub n_docs: usize,
    pub n_terms: usize,
    /// Sparse entries as `(row, col, weight)` triplets in row-major order.
    pub entries: Vec<(usize, usize, f64)>,
    pub vocabulary: Vec<String>,
    /// Smoothed IDF per vocabulary column, so the fitted weighting can be
    /// re-applied with the same formula.
    pub idf: Vec<f64>,
    pub documents: Vec<DocumentLabel>,
}

impl MatrixArtifact {
    pub fn from_corpus(corpus: &VectorizedCorpus) -> Self {
        let mut entries = Vec::with_capacity(corpus.matrix.nnz());
        for (row, row_vec) in corpus.matrix.outer_iterator().enumerate() {
            for (column, &weight) in row_vec.iter() {
                entries.push((row, column, weight));
            }
        }
        Self {
            n_docs: corpus.matrix.rows(),
            n_terms: corpus.matrix.cols(),
            entries,
            vocabulary: corpus.vocabulary.terms().to_vec(),
            idf: corpus.idf.clone(),
            documents: corpus.documents.clone(),
        }
    }

    /// Rebuild the in-memory stage output, checking consistency first.
    pub fn into_corpus(self) -> Result<VectorizedCorpus> {
        if self.documents.len() != self.n_docs {
            return Err(PipelineError::ShapeMismatch {
                stage: "matrix artifact",
                unit: "document labels",
                expected: self.n_docs,
                actual: self.documents.len(),
            });
        }
        if self.vocabulary.len() != self.n_terms {
            return Err(PipelineError::ShapeMismatch {
                stage: "matrix artifact",
                unit: "vocabulary terms",
                expected: self.n_terms,
                actual: self.vocabulary.len(),
            });
        }
        let mut triplets = TriMat::new((self.n_docs, self.n_terms));
        for &(row, column, weight) in &self.entries {
            if row >= self.n_docs || column >= self.n_terms {
                return Err(PipelineError::CorruptArtifact(format!(
                    "sparse entry ({row}, {column}) outside {}x{} matrix",
                    self.n_docs, self.n_terms
                )));
            }
            triplets.add_triplet(row, column, weight);
        }
        let matrix: CsMat<f64> = triplets.to_csr();
        Ok(VectorizedCorpus {
            matrix,
            vocabulary: Vocabulary::from_terms(self.vocabulary),
            documents: self.documents,
            idf: self.idf,
        })
    }
}

/// Persisted form of the topic reduction stage output.
#[derive(Debug, Serialize, Deserialize)]
pub struct TopicsArtifact {
    pub n_topics: usize,
    pub seed: u64,
    /// W rows, one per document.
    pub doc_topics: Vec<Vec<f64>>,
    /// H rows, one per topic.
    pub topic_terms: Vec<Vec<f64>>,
    pub vocabulary: Vec<String>,
    pub iterations: usize,
    pub reconstruction_err: f64,
}

impl TopicsArtifact {
    pub fn from_model(model: &TopicModel, vocabulary: &Vocabulary, seed: u64) -> Self {
        Self {
            n_topics: model.n_topics(),
            seed,
            doc_topics: model
                .doc_topics
                .rows()
                .into_iter()
                .map(|row| row.to_vec())
                .collect(),
            topic_terms: model
                .topic_terms
                .rows()
                .into_iter()
                .map(|row| row.to_vec())
                .collect(),
            vocabulary: vocabulary.terms().to_vec(),
            iterations: model.iterations,
            reconstruction_err: model.reconstruction_err,
        }
    }

    /// Rebuild W, the only factor the network stage consumes.
    pub fn doc_topic_matrix(&self) -> Result<Array2<f64>> {
        rows_to_array(&self.doc_topics, self.n_topics, "document-topic rows")
    }

    /// Rebuild H, kept for topic interpretation.
    pub fn topic_term_matrix(&self) -> Result<Array2<f64>> {
        rows_to_array(&self.topic_terms, self.vocabulary.len(), "topic-term rows")
    }
}

fn rows_to_array(rows: &[Vec<f64>], width: usize, what: &str) -> Result<Array2<f64>> {
    let mut array = Array2::zeros((rows.len(), width));
    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(PipelineError::CorruptArtifact(format!(
                "{what}: row {i} has {} columns, expected {width}",
                row.len()
            )));
        }
        for (j, &value) in row.iter().enumerate() {
            array[[i, j]] = value;
        }
    }
    Ok(array)
}

/// Write an artifact as JSON.
pub fn save_json<T: Serialize>(artifact: &T, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, artifact)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!(path = %path.display(), "Wrote stage artifact");
    Ok(())
}

/// Read an artifact back from JSON.
pub fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Write the `doc_index -> (brand, perfume_name)` mapping CSV.
pub fn save_mapping(documents: &[DocumentLabel], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["doc_index", "brand", "perfume_name"])?;
    for (doc_index, label) in documents.iter().enumerate() {
        let index = doc_index.to_string();
        writer.write_record([index.as_str(), label.brand.as_str(), label.name.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the mapping CSV back, checking that indices are dense and ordered.
pub fn load_mapping(path: &Path) -> Result<Vec<DocumentLabel>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut documents = Vec::new();
    for (expected, row) in reader.records().enumerate() {
        let row = row?;
        let doc_index: usize = row
            .get(0)
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| {
                PipelineError::CorruptArtifact(format!(
                    "mapping row {expected}: doc_index is not an integer"
                ))
            })?;
        if doc_index != expected {
            return Err(PipelineError::CorruptArtifact(format!(
                "mapping row {expected}: doc_index {doc_index} out of order"
            )));
        }
        documents.push(DocumentLabel {
            brand: row.get(1).unwrap_or_default().to_string(),
            name: row.get(2).unwrap_or_default().to_string(),
        });
    }
    Ok(documents)
}
