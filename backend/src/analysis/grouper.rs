//! Partition a batch by the value of one field.
//!
//! ```text
//! records (in order)          group_by(category)
//! ┌───────────────────┐       ┌──────────────────────────┐
//! │ 1: bp             │       │ "bp" → [1, 3]            │
//! │ 2: hr             │  →    │ "hr" → [2]               │
//! │ 3: bp             │       └──────────────────────────┘
//! └───────────────────┘
//! ```
//!
//! Keys are the string form of the field (`42` for whole numbers, compact JSON
//! for metadata). Records lacking the field share the `""` key.

use std::collections::BTreeMap;

use crate::models::{Record, RecordField};

/// Group records by a field, keeping input order inside each group.
pub fn group_by(records: &[Record], field: RecordField) -> BTreeMap<String, Vec<Record>> {
    let mut groups: BTreeMap<String, Vec<Record>> = BTreeMap::new();

    for record in records {
        let key = record.field_key(field).unwrap_or_default();
        groups.entry(key).or_default().push(record.clone());
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().filter_map(|r| r.id.as_deref()).collect()
    }

    #[test]
    fn test_group_by_category_preserves_order() {
        let records = vec![
            Record::new("1", "P1", "bp"),
            Record::new("2", "P2", "hr"),
            Record::new("3", "P1", "bp"),
            Record::new("4", "P3", "bp"),
        ];

        let groups = group_by(&records, RecordField::Category);

        assert_eq!(groups.len(), 2);
        assert_eq!(ids(&groups["bp"]), vec!["1", "3", "4"]);
        assert_eq!(ids(&groups["hr"]), vec!["2"]);
    }

    #[test]
    fn test_group_by_subject() {
        let records = vec![
            Record::new("1", "P1", "bp"),
            Record::new("2", "P2", "hr"),
            Record::new("3", "P1", "hr"),
        ];

        let groups = group_by(&records, RecordField::SubjectId);

        assert_eq!(ids(&groups["P1"]), vec!["1", "3"]);
        assert_eq!(ids(&groups["P2"]), vec!["2"]);
    }

    #[test]
    fn test_group_by_value_uses_wire_form() {
        let records = vec![
            Record::new("1", "P1", "bp").with_value(120.0),
            Record::new("2", "P2", "temp").with_value(98.6),
            Record::new("3", "P3", "bp").with_value(120.0),
            Record::new("4", "P4", "note"),
        ];

        let groups = group_by(&records, RecordField::Value);

        assert_eq!(ids(&groups["120"]), vec!["1", "3"]);
        assert_eq!(ids(&groups["98.6"]), vec!["2"]);
        assert_eq!(ids(&groups[""]), vec!["4"]);
    }

    #[test]
    fn test_group_by_metadata() {
        let mut meta = Map::new();
        meta.insert("device".into(), json!("cuff-01"));
        let records = vec![Record::new("1", "P1", "bp").with_metadata(meta)];

        let groups = group_by(&records, RecordField::Metadata);

        assert!(groups.contains_key(r#"{"device":"cuff-01"}"#));
    }

    #[test]
    fn test_empty_input_has_no_groups() {
        assert!(group_by(&[], RecordField::Category).is_empty());
    }
}
