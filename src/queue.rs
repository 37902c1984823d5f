use crate::types::PodRecord;
use std::collections::{HashSet, VecDeque};

/// FIFO of pods awaiting a tail probe, plus the ledger of pods whose logs were already seen.
///
/// The ledger only grows: once a pod is confirmed it is never probed again for the
/// lifetime of the process.
#[derive(Debug, Default)]
pub struct JobQueue {
    pending: VecDeque<PodRecord>,
    pending_keys: HashSet<String>,
    confirmed: HashSet<String>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the tail. Callers check [`is_confirmed`](Self::is_confirmed) and
    /// [`is_pending`](Self::is_pending) first.
    pub fn enqueue(&mut self, record: PodRecord) {
        self.pending_keys.insert(record.key());
        self.pending.push_back(record);
    }

    /// Pops the head, or `None` when the queue is empty.
    pub fn dequeue(&mut self) -> Option<PodRecord> {
        let record = self.pending.pop_front()?;
        self.pending_keys.remove(&record.key());
        Some(record)
    }

    pub fn mark_confirmed(&mut self, record: &PodRecord) {
        self.confirmed.insert(record.key());
    }

    pub fn is_confirmed(&self, record: &PodRecord) -> bool {
        self.confirmed.contains(&record.key())
    }

    pub fn is_pending(&self, record: &PodRecord) -> bool {
        self.pending_keys.contains(&record.key())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn confirmed_count(&self) -> usize {
        self.confirmed.len()
    }
}
