//! In-process exclusion for merges touching overlapping screenshots.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::CoreError;
use crate::types::DbId;

/// Screenshot ids currently held by an in-flight merge.
#[derive(Debug, Default)]
pub struct MergeLocks {
    held: Mutex<HashSet<DbId>>,
}

impl MergeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim every id in `ids`, or none of them.
    ///
    /// Fails with [`CoreError::TransactionConflict`] if any id is already held.
    /// The claim is released when the returned guard drops.
    pub fn try_acquire(self: &Arc<Self>, ids: &[DbId]) -> Result<MergeGuard, CoreError> {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(busy) = ids.iter().find(|id| held.contains(id)) {
            return Err(CoreError::TransactionConflict(format!(
                "Screenshot {busy} is already part of a merge in progress"
            )));
        }

        held.extend(ids.iter().copied());
        Ok(MergeGuard {
            locks: Arc::clone(self),
            ids: ids.to_vec(),
        })
    }

    pub fn is_held(&self, id: DbId) -> bool {
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&id)
    }
}

#[derive(Debug)]
pub struct MergeGuard {
    locks: Arc<MergeLocks>,
    ids: Vec<DbId>,
}

impl Drop for MergeGuard {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock().unwrap_or_else(|e| e.into_inner());
        for id in &self.ids {
            held.remove(id);
        }
    }
}
