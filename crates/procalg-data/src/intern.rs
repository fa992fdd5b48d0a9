//! Process-global hash-consing tables.
//!
//! Every sort and data expression node is stored once; handles share the
//! stored node so structural equality coincides with pointer equality.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

pub(crate) struct Interner<T> {
    table: OnceLock<Mutex<HashSet<Arc<T>>>>,
}

impl<T: Eq + Hash> Interner<T> {
    pub(crate) const fn new() -> Self {
        Self {
            table: OnceLock::new(),
        }
    }

    /// Return the shared node structurally equal to `value`, inserting it
    /// when it has not been seen before.
    pub(crate) fn intern(&self, value: T) -> Arc<T> {
        let table = self.table.get_or_init(|| Mutex::new(HashSet::new()));
        // A panic while holding the lock cannot leave the set half-updated.
        let mut guard = table.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = guard.get(&value) {
            return Arc::clone(existing);
        }
        let node = Arc::new(value);
        guard.insert(Arc::clone(&node));
        node
    }

    pub(crate) fn len(&self) -> usize {
        match self.table.get() {
            Some(table) => table.lock().unwrap_or_else(PoisonError::into_inner).len(),
            None => 0,
        }
    }
}

/// Number of distinct sort and term nodes created so far.
pub fn interned_node_counts() -> (usize, usize) {
    (crate::sort::interned_sorts(), crate::term::interned_terms())
}
