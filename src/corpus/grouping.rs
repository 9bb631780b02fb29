// Grouping: many per-source rows -> one document per (brand, perfume_name).

use std::collections::BTreeMap;

use super::records::DescriptorRecord;

/// One perfume's aggregated descriptor text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub brand: String,
    pub name: String,
    pub text: String,
}

/// Group records by `(brand, perfume_name)` and concatenate their text.
///
/// Output order is lexicographic by `(brand, name)`, which fixes the
/// eventual `doc_index` assignment across runs. Input order is preserved
/// within a group, so the concatenated text is reproducible too.
pub fn group_documents(records: &[DescriptorRecord]) -> Vec<Document> {
    let mut groups: BTreeMap<(String, String), Vec<&str>> = BTreeMap::new();
    for record in records {
        groups
            .entry((record.brand.clone(), record.perfume_name.clone()))
            .or_default()
            .push(record.descriptors.as_str());
    }

    groups
        .into_iter()
        .map(|((brand, name), texts)| Document {
            brand,
            name,
            text: texts.join(" ").trim().to_string(),
        })
        .collect()
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
    fn groups_sort_by_brand_then_name() {
        let records = vec![
            record("Zara", "Red", "cherry"),
            record("Armani", "Si", "blackcurrant"),
            record("Armani", "Code", "tonka"),
        ];
        let documents = group_documents(&records);
        let keys: Vec<(&str, &str)> = documents
            .iter()
            .map(|d| (d.brand.as_str(), d.name.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("Armani", "Code"), ("Armani", "Si"), ("Zara", "Red")]
        );
    }

    #[test]
    fn duplicate_keys_concatenate_in_input_order() {
        let records = vec![
            record("Dior", "Sauvage", "bergamot pepper"),
            record("Dior", "Sauvage", "ambroxan lavender"),
        ];
        let documents = group_documents(&records);
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].text, "bergamot pepper ambroxan lavender");
    }

    #[test]
    fn whitespace_only_text_trims_to_empty() {
        let records = vec![record("A", "X", "   ")];
        let documents = group_documents(&records);
        assert_eq!(documents[0].text, "");
    }
}
