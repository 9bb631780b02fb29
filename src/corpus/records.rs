// Descriptor records: the input contract with the upstream text collectors.
//
// Upstream (OCR, transcription, entity extraction, cleaning) produces a CSV
// table of per-source rows; several rows may describe the same perfume. The
// descriptor text arrives already lower-cased, punctuation-stripped, and
// lemmatized.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, Result};

/// One row of the input table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorRecord {
    pub brand: String,
    /// The `name` header is accepted as an alias for `perfume_name`.
    #[serde(alias = "name")]
    pub perfume_name: String,
    /// Cleaned free-text descriptors; may be empty for rows where upstream
    /// extraction found nothing usable.
    #[serde(default)]
    pub descriptors: String,
}

/// Required headers; `perfume_name` and `name` are interchangeable.
const REQUIRED: &[&[&str]] = &[&["brand"], &["perfume_name", "name"], &["descriptors"]];

/// Load descriptor records from a CSV file.
pub fn load_records(path: &Path) -> Result<Vec<DescriptorRecord>> {
    let file = File::open(path)?;
    read_records(file)
}

/// Load descriptor records from any reader.
///
/// Header presence is checked up front so a malformed table fails with the
/// offending column name instead of an opaque per-row error.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<DescriptorRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();
    for alternatives in REQUIRED {
        let present = alternatives
            .iter()
            .any(|wanted| headers.iter().any(|header| header == wanted));
        if !present {
            return Err(PipelineError::MissingColumns {
                column: alternatives.join("|"),
                found: headers.join(", "),
            });
        }
    }

    let mut records = Vec::new();
    for row in csv_reader.deserialize() {
        let record: DescriptorRecord = row?;
        records.push(record);
    }
    info!(rows = records.len(), "Loaded descriptor records");
    Ok(records)
}
