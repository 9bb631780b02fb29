// Topic reduction: nonnegative matrix factorization over the TF-IDF matrix.

pub mod nmf;

pub use nmf::{factorize, NmfParams, TopicModel};
