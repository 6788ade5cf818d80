//! Result types for query execution

use serde_json::Value;

use crate::record::Record;

/// One partition produced by group-by
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Shared value of the group field; `None` groups records lacking it
    pub key: Option<Value>,
    /// Records of the group after the per-group stages
    pub records: Vec<Record>,
}

/// Output of one pipeline execution
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// Flat result set
    Rows(Vec<Record>),
    /// Grouped result set, groups in first-appearance order
    Groups(Vec<Group>),
}

impl QueryOutput {
    /// Returns the flat rows, or `None` for grouped output
    pub fn rows(&self) -> Option<&[Record]> {
        match self {
            QueryOutput::Rows(rows) => Some(rows),
            QueryOutput::Groups(_) => None,
        }
    }

    /// Returns the groups, or `None` for flat output
    pub fn groups(&self) -> Option<&[Group]> {
        match self {
            QueryOutput::Rows(_) => None,
            QueryOutput::Groups(groups) => Some(groups),
        }
    }

    /// Total number of records across the output
    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Rows(rows) => rows.len(),
            QueryOutput::Groups(groups) => groups.iter().map(|g| g.records.len()).sum(),
        }
    }

    /// Returns true if no records were produced
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records; grouped output is flattened in group order
    pub fn into_records(self) -> Vec<Record> {
        match self {
            QueryOutput::Rows(rows) => rows,
            QueryOutput::Groups(groups) => groups.into_iter().flat_map(|g| g.records).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(id: i64) -> Record {
        json!({ "id": id }).as_object().unwrap().clone()
    }

    #[test]
    fn test_flatten_groups_in_order() {
        let output = QueryOutput::Groups(vec![
            Group { key: Some(json!("a")), records: vec![rec(1), rec(3)] },
            Group { key: None, records: vec![rec(2)] },
        ]);
        assert_eq!(output.len(), 3);
        assert!(output.rows().is_none());
        assert_eq!(output.into_records(), vec![rec(1), rec(3), rec(2)]);
    }

    #[test]
    fn test_empty_rows() {
        let output = QueryOutput::Rows(Vec::new());
        assert!(output.is_empty());
        assert!(output.groups().is_none());
    }
}
