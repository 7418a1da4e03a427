//! Flat ordered record list

use crate::filters::Filter;
use crate::model::Record;
use rayon::prelude::*;
use std::sync::Arc;

/// Keep the records `filter` accepts, in source order
pub(crate) fn filter_records(records: &[Arc<Record>], filter: &dyn Filter) -> Vec<Arc<Record>> {
    records.par_iter().for_each(|record| record.refresh_tags());
    records
        .par_iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct ListData {
    records: Vec<Arc<Record>>,
}

impl ListData {
    #[must_use]
    pub const fn new(records: Vec<Arc<Record>>) -> Self {
        Self { records }
    }

    /// The records, with tags reloaded from the store
    #[must_use]
    pub fn records(&self) -> &[Arc<Record>] {
        for record in &self.records {
            record.refresh_tags();
        }
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn filtered(&self, filter: &dyn Filter) -> Self {
        Self::new(filter_records(&self.records, filter))
    }
}

impl FromIterator<Record> for ListData {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Arc::new).collect())
    }
}
