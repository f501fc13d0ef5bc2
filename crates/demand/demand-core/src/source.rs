//! In-memory observation store.

use demand_spi::{ObservationRecord, ObservationSource, RecordFilter, Result};

/// An [`ObservationSource`] over an owned set of records.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<ObservationRecord>,
}

impl InMemorySource {
    pub fn new(records: Vec<ObservationRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: ObservationRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }
}

impl FromIterator<ObservationRecord> for InMemorySource {
    fn from_iter<I: IntoIterator<Item = ObservationRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl ObservationSource for InMemorySource {
    fn query(&self, filter: &RecordFilter) -> Result<Vec<ObservationRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}
