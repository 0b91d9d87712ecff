//! Column mapper
//!
//! Uploaded sheets arrive with inconsistent column ordering and the
//! occasional renamed header, so each logical field is located by a
//! case-insensitive substring match against a fixed keyword instead of by
//! position. A field whose keyword matches no header simply stays unmapped;
//! the normalizer reads unmapped fields as empty strings.

use crate::model::Field;
use std::collections::HashMap;

/// Index of each logical field within a header row.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    indices: HashMap<Field, usize>,
}

impl ColumnMap {
    /// Locate every field by keyword within the header row.
    ///
    /// The first matching header wins when a keyword matches more than one
    /// column.
    pub fn from_headers(headers: &[String]) -> Self {
        let mut indices = HashMap::new();

        for field in Field::ALL {
            let keyword = field.keyword();
            if let Some(index) = headers
                .iter()
                .position(|h| h.to_lowercase().contains(keyword))
            {
                indices.insert(field, index);
            }
        }

        Self { indices }
    }

    /// Column index for a field, if its keyword matched a header.
    pub fn index_of(&self, field: Field) -> Option<usize> {
        self.indices.get(&field).copied()
    }

    /// Number of fields that found a header.
    pub fn mapped_count(&self) -> usize {
        self.indices.len()
    }

    /// Read a field's cell from a data row.
    ///
    /// An unmapped field or a row shorter than the field's column both read
    /// as the empty string.
    pub fn value<'a>(&self, field: Field, row: &'a [String]) -> &'a str {
        self.index_of(field)
            .and_then(|index| row.get(index))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_matches_are_case_insensitive_substrings() {
        let map = ColumnMap::from_headers(&headers(&[
            "INCIDENT Number (SNOW)",
            "Short Bug Description",
            "Corrective Action Owner Name",
        ]));

        assert_eq!(map.index_of(Field::IncidentId), Some(0));
        assert_eq!(map.index_of(Field::Description), Some(1));
        assert_eq!(map.index_of(Field::CorrectiveOwner), Some(2));
        assert_eq!(map.index_of(Field::Environment), None);
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let map = ColumnMap::from_headers(&headers(&[
            "Environment",
            "Application",
            "Incident/Bug ID",
        ]));

        assert_eq!(map.index_of(Field::Environment), Some(0));
        assert_eq!(map.index_of(Field::Application), Some(1));
        assert_eq!(map.index_of(Field::IncidentId), Some(2));
    }

    #[test]
    fn test_qa_and_status_keywords_do_not_collide() {
        let map = ColumnMap::from_headers(&headers(&[
            "QA Corrective Action",
            "Corrective Action Status",
            "Corrective Action Owner",
        ]));

        assert_eq!(map.index_of(Field::QaCorrectiveAction), Some(0));
        assert_eq!(map.index_of(Field::CorrectiveStatus), Some(1));
        assert_eq!(map.index_of(Field::CorrectiveOwner), Some(2));
    }

    #[test]
    fn test_unmapped_field_reads_empty() {
        let map = ColumnMap::from_headers(&headers(&["Incident"]));
        let row = vec!["526480".to_string()];

        assert_eq!(map.value(Field::IncidentId, &row), "526480");
        assert_eq!(map.value(Field::Description, &row), "");
    }

    #[test]
    fn test_short_row_reads_empty() {
        let map = ColumnMap::from_headers(&headers(&["Incident", "Bug Description"]));
        let row = vec!["526480".to_string()];

        assert_eq!(map.value(Field::Description, &row), "");
    }
}
