//! Tabular records: a list plus column names

use super::list::filter_records;
use crate::filters::Filter;
use crate::model::Record;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct TableData {
    records: Vec<Arc<Record>>,
    columns: Option<Vec<String>>,
}

impl TableData {
    #[must_use]
    pub const fn new(records: Vec<Arc<Record>>) -> Self {
        Self {
            records,
            columns: None,
        }
    }

    #[must_use]
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Explicit columns, or else every field name in use, sorted
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        if let Some(columns) = &self.columns {
            return columns.clone();
        }
        self.records
            .iter()
            .flat_map(|record| record.fields().keys())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect()
    }

    /// The records, with tags reloaded from the store
    #[must_use]
    pub fn records(&self) -> &[Arc<Record>] {
        for record in &self.records {
            record.refresh_tags();
        }
        &self.records
    }

    /// Cell values of `record` in column order; missing fields are empty
    #[must_use]
    pub fn row<'a>(&self, record: &'a Record) -> Vec<&'a str> {
        self.columns()
            .iter()
            .map(|column| record.field(column).unwrap_or(""))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Filtered rows; explicit columns carry over to the view
    #[must_use]
    pub fn filtered(&self, filter: &dyn Filter) -> Self {
        Self {
            records: filter_records(&self.records, filter),
            columns: self.columns.clone(),
        }
    }
}
