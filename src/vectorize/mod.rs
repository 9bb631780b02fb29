// Vectorization: grouped documents -> vocabulary + TF-IDF term-document matrix.

pub mod tfidf;
pub mod vocabulary;

pub use tfidf::{base_stop_words, DocumentLabel, TfIdfVectorizer, VectorizedCorpus};
pub use vocabulary::Vocabulary;
