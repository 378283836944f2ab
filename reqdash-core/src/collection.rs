//! Ordered, in-memory collection of requirement records.

use crate::models::{RecordPatch, RequirementRecord};

/// The requirements currently shown on the dashboard, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementCollection {
    records: Vec<RequirementRecord>,
}

impl RequirementCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards every record and takes `records` in their given order
    pub fn replace_all(&mut self, records: Vec<RequirementRecord>) {
        self.records = records;
    }

    /// Adds a record at the end. Ids are not checked for uniqueness.
    pub fn append(&mut self, record: RequirementRecord) {
        self.records.push(record);
    }

    /// Applies `patch` to the record at `index` in place.
    /// Returns false when there is no such record.
    pub fn update_at(&mut self, index: usize, patch: RecordPatch) -> bool {
        match self.records.get_mut(index) {
            Some(record) => {
                patch.apply(record);
                true
            }
            None => false,
        }
    }

    pub fn all(&self) -> &[RequirementRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&RequirementRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with non-blank text, paired with their position in the collection
    pub fn visible(&self) -> impl Iterator<Item = (usize, &RequirementRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.is_listable())
    }
}
