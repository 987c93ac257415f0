use std::collections::HashMap;

use promise_lens_protocol::{Guid, PromiseRecord};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::collapse::CollapseState;
use super::store::PromiseStore;
use super::validate::{RecordError, validate};

/// A batch entry that was left out of the tree.
#[derive(Debug)]
pub struct RejectedEntry {
    /// Position of the entry in the incoming batch.
    pub index: usize,
    /// Guid of the entry, when it could be read.
    pub guid: Option<Guid>,
    pub error: RecordError,
}

/// What one `apply_batch` call changed.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
    pub rejected: Vec<RejectedEntry>,
}

impl BatchReport {
    /// Number of records now in the tree.
    pub fn applied(&self) -> usize {
        self.inserted + self.updated
    }
}

/// The reconciled promise forest plus its collapse state.
///
/// Every batch is authoritative: records absent from it are removed, and
/// the new store is built off to the side and swapped in whole, so readers
/// never see a mix of two batches.
#[derive(Debug, Clone)]
pub struct PromiseTree {
    store: PromiseStore,
    collapse: CollapseState,
    next_seq: u64,
    collapse_new_nodes: bool,
}

impl PromiseTree {
    pub fn new(collapse_new_nodes: bool) -> Self {
        Self {
            store: PromiseStore::new(),
            collapse: CollapseState::new(),
            next_seq: 0,
            collapse_new_nodes,
        }
    }

    pub fn store(&self) -> &PromiseStore {
        &self.store
    }

    pub fn collapse_state(&self) -> &CollapseState {
        &self.collapse
    }

    pub fn get(&self, guid: Guid) -> Option<&PromiseRecord> {
        self.store.get(guid)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Decode raw entries one by one and apply the ones that survive.
    pub fn apply_raw_batch(&mut self, entries: &[Value]) -> BatchReport {
        let mut rejected = Vec::new();
        let mut records = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match PromiseRecord::deserialize(entry) {
                Ok(record) => records.push((index, record)),
                Err(err) => rejected.push(RejectedEntry {
                    index,
                    guid: entry.get("guid").and_then(Value::as_u64).map(Guid),
                    error: RecordError::from(err),
                }),
            }
        }
        self.apply_indexed(records, rejected)
    }

    /// Replace the working set with `records`.
    pub fn apply_batch(&mut self, records: impl IntoIterator<Item = PromiseRecord>) -> BatchReport {
        self.apply_indexed(records.into_iter().enumerate().collect(), Vec::new())
    }

    fn apply_indexed(
        &mut self,
        records: Vec<(usize, PromiseRecord)>,
        mut rejected: Vec<RejectedEntry>,
    ) -> BatchReport {
        // Duplicate guids: the last snapshot wins, the first position is kept.
        let mut accepted: Vec<PromiseRecord> = Vec::with_capacity(records.len());
        let mut positions: HashMap<Guid, usize> = HashMap::with_capacity(records.len());
        for (index, record) in records {
            if let Err(error) = validate(&record) {
                rejected.push(RejectedEntry {
                    index,
                    guid: Some(record.guid),
                    error,
                });
                continue;
            }
            match positions.get(&record.guid) {
                Some(&pos) => accepted[pos] = record,
                None => {
                    positions.insert(record.guid, accepted.len());
                    accepted.push(record);
                }
            }
        }

        let mut report = BatchReport::default();
        let mut next_seq = self.next_seq;
        let mut entries = Vec::with_capacity(accepted.len());
        for record in accepted {
            let seq = match self.store.seq(record.guid) {
                Some(seq) => {
                    report.updated += 1;
                    seq
                }
                None => {
                    report.inserted += 1;
                    let seq = next_seq;
                    next_seq += 1;
                    seq
                }
            };
            entries.push((seq, record));
        }
        report.removed = self
            .store
            .records()
            .filter(|record| !positions.contains_key(&record.guid))
            .count();

        let collapse = self
            .collapse
            .carry_over(positions.keys().copied(), self.collapse_new_nodes);
        let store = PromiseStore::build(entries);

        self.store = store;
        self.collapse = collapse;
        self.next_seq = next_seq;

        for entry in &rejected {
            warn!(
                index = entry.index,
                guid = ?entry.guid,
                error = %entry.error,
                "rejected promise record"
            );
        }
        report.rejected = rejected;
        debug!(
            inserted = report.inserted,
            updated = report.updated,
            removed = report.removed,
            rejected = report.rejected.len(),
            "applied promise batch"
        );
        report
    }

    /// Drop every record and every collapse flag.
    pub fn clear(&mut self) {
        self.store = PromiseStore::new();
        self.collapse.clear();
        self.next_seq = 0;
        debug!("cleared promise tree");
    }

    /// Flip the collapse flag of one node. Unknown guids are ignored.
    pub fn toggle(&mut self, guid: Guid) -> bool {
        self.collapse.toggle(guid)
    }

    pub fn is_collapsed(&self, guid: Guid) -> bool {
        self.collapse.is_collapsed(guid)
    }
}

impl Default for PromiseTree {
    fn default() -> Self {
        Self::new(true)
    }
}
