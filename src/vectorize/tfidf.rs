// TF-IDF vectorization of grouped descriptor documents.
//
// Weighting: raw term frequency scaled by smoothed inverse document
// frequency, idf(t) = ln((1 + n) / (1 + df(t))) + 1, then each row is
// L2-normalized. The smoothing keeps corpus-wide terms from zeroing out;
// any re-application of a fitted vectorizer must use the same formula,
// which is why the IDF vector travels with the matrix artifact.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};
use stop_words::{get, LANGUAGE};
use tracing::info;

use crate::config::DEFAULT_MIN_TOKEN_LEN;
use crate::corpus::{group_documents, DescriptorRecord};
use crate::error::{PipelineError, Result};

use super::vocabulary::Vocabulary;

/// Identity label attached to each matrix row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLabel {
    pub brand: String,
    pub name: String,
}

/// Everything the vectorization stage emits.
#[derive(Debug)]
pub struct VectorizedCorpus {
    /// Sparse TF-IDF matrix; row `i` belongs to `documents[i]`.
    pub matrix: CsMat<f64>,
    pub vocabulary: Vocabulary,
    /// Ordered `doc_index -> (brand, name)` mapping; indices are dense.
    pub documents: Vec<DocumentLabel>,
    /// Smoothed IDF per vocabulary column.
    pub idf: Vec<f64>,
}

/// The base English stop-word list.
pub fn base_stop_words() -> HashSet<String> {
    get(LANGUAGE::English).into_iter().collect()
}

/// Turns descriptor records into a weighted term-document matrix.
///
/// The stop-word set and token length floor are explicit configuration.
/// The upstream cleaner removes most noise already; this is the last line
/// of token hygiene before weighting.
pub struct TfIdfVectorizer {
    pub stop_words: HashSet<String>,
    pub min_token_len: usize,
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self {
            stop_words: base_stop_words(),
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
        }
    }
}

impl TfIdfVectorizer {
    /// Vectorizer with corpus-specific stop words on top of the base list.
    pub fn with_extra_stop_words<I>(extra: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut vectorizer = Self::default();
        vectorizer.stop_words.extend(extra);
        vectorizer
    }

    /// Group, tokenize, filter, and weight the input records.
    ///
    /// Groups whose text keeps no token are dropped before indexing, so the
    /// emitted `doc_index` range is dense and every matrix row has at least
    /// one nonzero entry. Fails with `EmptyCorpus` when nothing survives.
    pub fn fit_transform(&self, records: &[DescriptorRecord]) -> Result<VectorizedCorpus> {
        let grouped = group_documents(records);
        let group_count = grouped.len();

        let mut labels = Vec::new();
        let mut token_docs: Vec<Vec<String>> = Vec::new();
        for document in grouped {
            let tokens = self.tokenize(&document.text);
            if tokens.is_empty() {
                continue;
            }
            labels.push(DocumentLabel {
                brand: document.brand,
                name: document.name,
            });
            token_docs.push(tokens);
        }

        let dropped = group_count - labels.len();
        if dropped > 0 {
            info!(dropped, "Dropped documents with no usable descriptor text");
        }
        if labels.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }

        // Vocabulary in lexicographic column order.
        let term_set: BTreeSet<&str> = token_docs
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        let vocabulary =
            Vocabulary::from_terms(term_set.into_iter().map(str::to_string).collect());

        // Document frequencies.
        let mut document_frequency = vec![0usize; vocabulary.len()];
        for tokens in &token_docs {
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                if let Some(column) = vocabulary.index_of(term) {
                    document_frequency[column] += 1;
                }
            }
        }

        let n_docs = labels.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        // Weight and L2-normalize each row, collecting sparse triplets.
        // Columns are sorted so the CSR layout is identical across runs.
        let mut triplets = TriMat::new((labels.len(), vocabulary.len()));
        for (row, tokens) in token_docs.iter().enumerate() {
            let mut counts: HashMap<usize, f64> = HashMap::new();
            for token in tokens {
                if let Some(column) = vocabulary.index_of(token) {
                    *counts.entry(column).or_insert(0.0) += 1.0;
                }
            }

            let mut weighted: Vec<(usize, f64)> = counts
                .into_iter()
                .map(|(column, tf)| (column, tf * idf[column]))
                .collect();
            weighted.sort_by_key(|&(column, _)| column);

            let norm = weighted
                .iter()
                .map(|(_, weight)| weight * weight)
                .sum::<f64>()
                .sqrt();
            for (column, weight) in weighted {
                triplets.add_triplet(row, column, weight / norm);
            }
        }

        let matrix: CsMat<f64> = triplets.to_csr();
        info!(
            documents = labels.len(),
            terms = vocabulary.len(),
            nonzeros = matrix.nnz(),
            "Vectorized corpus"
        );

        Ok(VectorizedCorpus {
            matrix,
            vocabulary,
            documents: labels,
            idf,
        })
    }

    /// Whitespace tokenization with stop-word and length filtering.
    ///
    /// Lower-casing is repeated here even though upstream cleans the text;
    /// it keeps the vocabulary consistent if a raw capital slips through.
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .map(str::to_lowercase)
            .filter(|token| token.chars().count() >= self.min_token_len)
            .filter(|token| !self.stop_words.contains(token))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(brand: &str, name: &str, descriptors: &str) -> DescriptorRecord {
        DescriptorRecord {
            brand: brand.to_string(),
            perfume_name: name.to_string(),
            descriptors: descriptors.to_string(),
        }
    }

    #[test]
    fn fit_transform_basic() {
        let records = vec![
            record("Dior", "Sauvage", "bergamot pepper ambroxan"),
            record("Chanel", "Bleu", "citrus incense woody"),
        ];
        let corpus = TfIdfVectorizer::default().fit_transform(&records).unwrap();

        assert_eq!(corpus.matrix.rows(), 2);
        assert_eq!(corpus.matrix.cols(), 6);
        assert_eq!(corpus.documents.len(), 2);
        // Lexicographic document order: Chanel before Dior.
        assert_eq!(corpus.documents[0].brand, "Chanel");
        assert_eq!(corpus.documents[1].brand, "Dior");
    }

    #[test]
    fn empty_corpus_fails() {
        let records = vec![record("A", "X", "   ")];
        let result = TfIdfVectorizer::default().fit_transform(&records);
        assert!(matches!(result, Err(PipelineError::EmptyCorpus)));
    }

    #[test]
    fn duplicate_records_become_one_row() {
        let records = vec![
            record("Dior", "Sauvage", "bergamot pepper"),
            record("Dior", "Sauvage", "ambroxan"),
        ];
        let corpus = TfIdfVectorizer::default().fit_transform(&records).unwrap();
        assert_eq!(corpus.matrix.rows(), 1);
        assert_eq!(corpus.matrix.cols(), 3);
    }

    #[test]
    fn rows_are_unit_norm() {
        let records = vec![
            record("A", "X", "sweet vanilla warm warm"),
            record("B", "Z", "citrus fresh sharp"),
        ];
        let corpus = TfIdfVectorizer::default().fit_transform(&records).unwrap();
        for row in corpus.matrix.outer_iterator() {
            let norm_sq: f64 = row.iter().map(|(_, &v)| v * v).sum();
            assert!(
                (norm_sq - 1.0).abs() < 1e-9,
                "Row not L2-normalized: {norm_sq}"
            );
        }
    }

    #[test]
    fn stop_words_and_short_tokens_filtered() {
        let vectorizer =
            TfIdfVectorizer::with_extra_stop_words(vec!["smells".to_string()]);
        let records = vec![record("A", "X", "smells of a sweet vanilla")];
        let corpus = vectorizer.fit_transform(&records).unwrap();
        // "smells" (extra stop word), "of"/"a" (base list / too short) go away.
        assert_eq!(corpus.vocabulary.terms(), ["sweet", "vanilla"]);
    }
}
