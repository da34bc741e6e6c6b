//! Read-only corpus store: position-indexed question/answer records.
//!
//! Positions are shared with the vector index; both sides are produced
//! together by the offline indexing step and loaded from the same artifact.

use qadesk_core::types::QaRecord;

/// Positionally indexed collection of corpus records.
///
/// Loaded once per process and never mutated by query traffic.
#[derive(Debug, Clone, Default)]
pub struct CorpusStore {
    records: Vec<QaRecord>,
}

impl CorpusStore {
    pub fn new(records: Vec<QaRecord>) -> Self {
        Self { records }
    }

    /// Resolve a corpus position to its record.
    ///
    /// Returns `None` for out-of-range positions. A `None` here for a
    /// position the index returned means the index and corpus have drifted
    /// apart; callers drop the hit and log it.
    pub fn get(&self, position: usize) -> Option<&QaRecord> {
        self.records.get(position)
    }

    /// All records, in position order.
    pub fn records(&self) -> &[QaRecord] {
        &self.records
    }

    /// Number of records in the store.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the store contains no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
