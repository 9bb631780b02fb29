// Input corpus handling: descriptor records and document grouping.

pub mod grouping;
pub mod records;

pub use grouping::{group_documents, Document};
pub use records::{load_records, read_records, DescriptorRecord};
