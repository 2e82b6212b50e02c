//! Result table: index-addressed sink for produced content identifiers.
//!
//! Workers write their own index; nobody reads until the completion barrier
//! has been crossed. Two entries can still map to one index (`1.png` and
//! `1.jpg`), so slots sit behind a lock and a replaced slot is logged.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::gateway::Cid;

#[derive(Debug, Default)]
pub struct ResultTable {
    slots: Mutex<BTreeMap<u64, Cid>>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<u64, Cid>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store `cid` at 1-based `index`. Returns the value it replaced, if any.
    pub fn record(&self, index: u64, cid: Cid) -> Option<Cid> {
        let previous = self.lock().insert(index, cid);
        if let Some(ref prev) = previous {
            tracing::warn!("index {} written twice; replacing {}", index, prev);
        }
        previous
    }

    /// Copy of all populated slots, ordered by index. Sparse: only indices
    /// that were recorded are present, however large they are.
    pub fn snapshot(&self) -> BTreeMap<u64, Cid> {
        self.lock().clone()
    }
}
